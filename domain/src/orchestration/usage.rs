//! Tool usage log entries.

use crate::tool::entities::ToolInvocation;
use crate::tool::value_objects::ToolResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const SUMMARY_MAX_BYTES: usize = 200;

/// One tool run recorded during a chat-with-tools session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolUsage {
    /// Round (1-based) in which the model asked for the tool
    pub round: usize,
    pub tool: String,
    pub arguments: Value,
    pub success: bool,
    /// Bounded rendering of the result or error
    pub summary: String,
    #[serde(default)]
    pub cached: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl ToolUsage {
    pub fn record(round: usize, call: &ToolInvocation, result: &ToolResult) -> Self {
        Self {
            round,
            tool: call.tool_name.clone(),
            arguments: call.arguments_json(),
            success: result.is_success(),
            summary: result.summary(SUMMARY_MAX_BYTES),
            cached: result.metadata.cached,
            duration_ms: result.metadata.duration_ms,
        }
    }
}
