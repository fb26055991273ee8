//! LLM response types for function calling.
//!
//! A chat completion comes back as assistant text, optionally alongside
//! structured tool-call requests. [`LlmResponse`] models both as an
//! ordered list of [`ContentBlock`]s so the orchestrator can decide
//! whether to run tools or finish.

use crate::tool::entities::ToolInvocation;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A single block of content within an LLM response.
///
/// ```
/// use deepseek_domain::session::response::ContentBlock;
///
/// let text = ContentBlock::Text("Let me check the weather.".to_string());
/// assert!(text.as_text().is_some());
///
/// let tool = ContentBlock::ToolUse {
///     id: "call_abc123".to_string(),
///     name: "weather".to_string(),
///     input: [("location".to_string(), serde_json::json!("Paris"))]
///         .into_iter().collect(),
/// };
/// assert!(tool.as_tool_use().is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// A text content block from the model.
    Text(String),

    /// A tool call request from the model.
    ToolUse {
        /// API-assigned ID for correlating with tool results (e.g. "call_abc123").
        id: String,
        /// Requested tool name.
        name: String,
        /// Decoded arguments.
        input: HashMap<String, Value>,
    },
}

impl ContentBlock {
    /// Returns the text content if this is a `Text` block.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns `(id, name, input)` if this is a `ToolUse` block.
    pub fn as_tool_use(&self) -> Option<(&str, &str, &HashMap<String, Value>)> {
        match self {
            ContentBlock::ToolUse { id, name, input } => Some((id, name, input)),
            _ => None,
        }
    }
}

/// Reason the model stopped generating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Natural end of response.
    EndTurn,
    /// The model wants tools run before it continues.
    ToolUse,
    /// Hit the token limit; the response may be truncated.
    MaxTokens,
    /// Provider-specific stop reason.
    Other(String),
}

impl StopReason {
    /// Map an OpenAI-style `finish_reason`.
    pub fn from_finish_reason(reason: &str) -> Self {
        match reason {
            "stop" => StopReason::EndTurn,
            "tool_calls" | "function_call" => StopReason::ToolUse,
            "length" => StopReason::MaxTokens,
            other => StopReason::Other(other.to_string()),
        }
    }
}

/// Token accounting reported by the API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// A structured response from an LLM, supporting both text and tool calls.
///
/// ```
/// use deepseek_domain::session::response::{ContentBlock, LlmResponse, StopReason};
///
/// let response = LlmResponse::from_text("Hello!");
/// assert_eq!(response.text_content(), "Hello!");
/// assert!(!response.has_tool_calls());
///
/// let response = LlmResponse {
///     content: vec![
///         ContentBlock::Text("Checking...".to_string()),
///         ContentBlock::ToolUse {
///             id: "call_1".to_string(),
///             name: "calculator".to_string(),
///             input: [("expression".to_string(), serde_json::json!("12*7"))]
///                 .into_iter().collect(),
///         },
///     ],
///     reasoning: None,
///     stop_reason: Some(StopReason::ToolUse),
///     model: Some("deepseek-chat".to_string()),
///     usage: None,
/// };
/// assert!(response.has_tool_calls());
/// assert_eq!(response.tool_calls().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LlmResponse {
    /// Content blocks in the response (text and/or tool calls).
    pub content: Vec<ContentBlock>,
    /// Chain-of-thought returned separately by reasoning models.
    pub reasoning: Option<String>,
    /// Why the model stopped generating.
    pub stop_reason: Option<StopReason>,
    /// Model identifier (if returned by the API).
    pub model: Option<String>,
    /// Token usage (if returned by the API).
    pub usage: Option<TokenUsage>,
}

impl LlmResponse {
    /// Create a text-only response.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text(text.into())],
            reasoning: None,
            stop_reason: Some(StopReason::EndTurn),
            model: None,
            usage: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Concatenate all `Text` content blocks into a single string.
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .filter_map(|b| b.as_text())
            .collect::<Vec<_>>()
            .join("")
    }

    /// Extract all `ToolUse` content blocks as invocations.
    pub fn tool_calls(&self) -> Vec<ToolInvocation> {
        self.content
            .iter()
            .filter_map(|b| match b {
                ContentBlock::ToolUse { id, name, input } => Some(
                    ToolInvocation::new(name.as_str())
                        .with_id(id.as_str())
                        .with_arguments(input.clone()),
                ),
                _ => None,
            })
            .collect()
    }

    /// Returns `true` if the response contains any tool call requests.
    pub fn has_tool_calls(&self) -> bool {
        self.content
            .iter()
            .any(|b| matches!(b, ContentBlock::ToolUse { .. }))
    }
}
