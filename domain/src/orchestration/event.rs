//! Typed chat events for incremental UI updates.
//!
//! Use cases emit these through a sink; the transport (terminal, SSE,
//! websocket) decides how to render them.

use super::usage::ToolUsage;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// The user's message was accepted
    UserReceived { content: String },
    /// The assistant started a new reply (one per model round)
    AssistantStart { round: usize },
    /// A fragment of assistant text
    ContentChunk { content: String },
    /// Everything shown so far for this reply should be replaced
    ReplaceContent { content: String },
    ToolInvoked {
        round: usize,
        tool: String,
        arguments: Value,
    },
    ToolCompleted {
        round: usize,
        tool: String,
        success: bool,
        summary: String,
    },
    /// Final answer
    Complete {
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_usage: Vec<ToolUsage>,
    },
    Error { message: String },
}

impl ChatEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChatEvent::Complete { .. } | ChatEvent::Error { .. })
    }
}
