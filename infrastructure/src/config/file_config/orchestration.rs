//! `[orchestration]` and `[chat]` sections

use deepseek_application::config::OrchestrationParams;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOrchestrationConfig {
    pub max_rounds: usize,
    pub max_tools_per_round: usize,
    /// Whole-session deadline; `0` disables it
    pub timeout_secs: u64,
}

impl Default for FileOrchestrationConfig {
    fn default() -> Self {
        let params = OrchestrationParams::default();
        Self {
            max_rounds: params.max_rounds,
            max_tools_per_round: params.max_tools_per_round,
            timeout_secs: params.timeout.map_or(0, |t| t.as_secs()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileChatConfig {
    /// Reduce reasoning-model answers to their conclusion
    pub extract_answer_only: bool,
    pub system_prompt: Option<String>,
    /// Prepend the current date and time to the system prompt
    pub realtime_context: bool,
}

impl Default for FileChatConfig {
    fn default() -> Self {
        Self {
            extract_answer_only: false,
            system_prompt: None,
            realtime_context: true,
        }
    }
}

impl FileOrchestrationConfig {
    pub fn to_params(&self, chat: &FileChatConfig) -> OrchestrationParams {
        OrchestrationParams::default()
            .with_max_rounds(self.max_rounds)
            .with_max_tools_per_round(self.max_tools_per_round)
            .with_timeout((self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs)))
            .with_extract_answer_only(chat.extract_answer_only)
    }
}
