//! Output formatter trait

use deepseek_application::{ChatWithToolsOutput, RunChatOutput};
use deepseek_domain::{ToolSpec, ToolStatusReport, ToolUsage};
use serde::Serialize;
use std::collections::BTreeMap;

/// Final result of one `ask`, `chat` turn or `complete`, independent of
/// which use case produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerReport {
    pub answer: Option<String>,
    pub state: String,
    pub rounds: usize,
    pub limit_reached: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tool_usage: Vec<ToolUsage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnswerReport {
    pub fn completion(text: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            answer: Some(text.into()),
            state: "DONE".to_string(),
            rounds: 1,
            limit_reached: false,
            tool_usage: Vec::new(),
            model: Some(model.into()),
            reasoning: None,
            error: None,
        }
    }

    pub fn failed(error: impl ToString) -> Self {
        Self {
            answer: None,
            state: "ABORTED".to_string(),
            rounds: 0,
            limit_reached: false,
            tool_usage: Vec::new(),
            model: None,
            reasoning: None,
            error: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.answer.is_some()
    }
}

impl From<&ChatWithToolsOutput> for AnswerReport {
    fn from(output: &ChatWithToolsOutput) -> Self {
        Self {
            answer: output.answer.clone(),
            state: output.state.to_string(),
            rounds: output.rounds,
            limit_reached: output.limit_reached,
            tool_usage: output.usage_log.clone(),
            model: None,
            reasoning: None,
            error: output.error.as_ref().map(ToString::to_string),
        }
    }
}

impl From<&RunChatOutput> for AnswerReport {
    fn from(output: &RunChatOutput) -> Self {
        Self {
            answer: Some(output.answer.clone()),
            state: "DONE".to_string(),
            rounds: 1,
            limit_reached: false,
            tool_usage: Vec::new(),
            model: Some(output.model.clone()),
            reasoning: output.reasoning.clone(),
            error: None,
        }
    }
}

/// Trait for rendering results for the terminal or for scripts
pub trait OutputFormatter {
    /// Format a final answer (or the reason there is none)
    fn format_answer(&self, report: &AnswerReport) -> String;

    /// Format the registered tools and their parameters
    fn format_tool_list(&self, specs: &[ToolSpec]) -> String;

    /// Format per-tool health and cache statistics
    fn format_status(&self, report: &BTreeMap<String, ToolStatusReport>) -> String;

    /// Format the result of a cache clear
    fn format_cleared(&self, tools: &[String]) -> String;
}
