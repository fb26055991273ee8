//! Orchestration parameters: chat-with-tools loop control.
//!
//! [`OrchestrationParams`] groups the static limits of
//! [`ChatWithToolsUseCase`](crate::use_cases::chat_with_tools::ChatWithToolsUseCase).

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Chat-with-tools loop control parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationParams {
    /// Maximum number of model calls in one session.
    pub max_rounds: usize,
    /// Maximum tool calls honoured per round; extra requests are dropped.
    pub max_tools_per_round: usize,
    /// Overall deadline for the whole session.
    pub timeout: Option<Duration>,
    /// Reduce reasoning-model answers to their conclusion.
    pub extract_answer_only: bool,
}

impl Default for OrchestrationParams {
    fn default() -> Self {
        Self {
            max_rounds: 3,
            max_tools_per_round: 5,
            timeout: Some(Duration::from_secs(120)),
            extract_answer_only: false,
        }
    }
}

impl OrchestrationParams {
    // ==================== Builder Methods ====================

    pub fn with_max_rounds(mut self, max: usize) -> Self {
        self.max_rounds = max;
        self
    }

    pub fn with_max_tools_per_round(mut self, max: usize) -> Self {
        self.max_tools_per_round = max;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_extract_answer_only(mut self, enabled: bool) -> Self {
        self.extract_answer_only = enabled;
        self
    }
}
