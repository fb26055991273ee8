//! Wire types for the DeepSeek (OpenAI-compatible) HTTP API
//!
//! Requests and responses for `/chat/completions` and the legacy
//! `/completions` endpoint, plus the chunk shape of the SSE stream.

use deepseek_domain::{ContentBlock, LlmResponse, Message, StopReason, TokenUsage};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

use super::error::{DeepSeekError, Result};

/// Body of `POST /chat/completions`
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Value>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub stream: bool,
}

impl ChatCompletionRequest {
    pub fn streaming(mut self) -> Self {
        self.stream = true;
        self
    }
}

/// A chat message as the API sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<WireToolCall>,
    /// Chain-of-thought of reasoning models; only ever received
    #[serde(default, skip_serializing)]
    pub reasoning_content: Option<String>,
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        let tool_calls = message
            .tool_calls
            .iter()
            .map(|call| WireToolCall {
                id: call.id.clone().unwrap_or_default(),
                kind: "function".to_string(),
                function: WireFunction {
                    name: call.tool_name.clone(),
                    arguments: call.arguments_json().to_string(),
                },
            })
            .collect::<Vec<_>>();

        // Assistant turns that only call tools carry no text
        let content = if message.content.is_empty() && !tool_calls.is_empty() {
            None
        } else {
            Some(message.content.clone())
        };

        Self {
            role: message.role.as_str().to_string(),
            content,
            name: message.name.clone(),
            tool_call_id: message.tool_call_id.clone(),
            tool_calls,
            reasoning_content: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireToolCall {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,
    pub function: WireFunction,
}

fn function_kind() -> String {
    "function".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireFunction {
    pub name: String,
    /// JSON-encoded arguments, as produced by the model
    #[serde(default)]
    pub arguments: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WireUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl From<WireUsage> for TokenUsage {
    fn from(u: WireUsage) -> Self {
        TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        }
    }
}

/// Response of a non-streaming `POST /chat/completions`
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<WireUsage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: WireMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

impl ChatCompletionResponse {
    /// Convert the first choice into a domain response.
    pub fn into_llm_response(self) -> Result<LlmResponse> {
        let choice = self.choices.into_iter().next().ok_or_else(|| {
            DeepSeekError::UnexpectedResponse("response contained no choices".to_string())
        })?;

        let mut content = Vec::new();
        if let Some(text) = choice.message.content.filter(|t| !t.is_empty()) {
            content.push(ContentBlock::Text(text));
        }
        for call in choice.message.tool_calls {
            content.push(tool_use_block(call.id, call.function.name, &call.function.arguments));
        }

        Ok(LlmResponse {
            content,
            reasoning: choice.message.reasoning_content.filter(|r| !r.is_empty()),
            stop_reason: choice
                .finish_reason
                .as_deref()
                .map(StopReason::from_finish_reason),
            model: self.model,
            usage: self.usage.map(TokenUsage::from),
        })
    }
}

/// Build a `ToolUse` block from the model's JSON-encoded arguments.
///
/// Arguments that are not a JSON object are replaced by an empty map; the
/// tool's validator then reports what is missing back to the model.
pub(crate) fn tool_use_block(id: String, name: String, arguments: &str) -> ContentBlock {
    let input = if arguments.trim().is_empty() {
        HashMap::new()
    } else {
        match serde_json::from_str::<HashMap<String, Value>>(arguments) {
            Ok(map) => map,
            Err(e) => {
                warn!(tool = %name, error = %e, "Model sent malformed tool arguments");
                HashMap::new()
            }
        }
    };
    ContentBlock::ToolUse { id, name, input }
}

/// Body of the legacy `POST /completions`
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletionChoice {
    #[serde(default)]
    pub text: String,
}

impl CompletionResponse {
    pub fn into_text(self) -> Result<String> {
        self.choices
            .into_iter()
            .next()
            .map(|c| c.text)
            .ok_or_else(|| {
                DeepSeekError::UnexpectedResponse("completion contained no choices".to_string())
            })
    }
}

/// One `data:` payload of the SSE stream
#[derive(Debug, Clone, Deserialize)]
pub struct StreamChunk {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
    #[serde(default)]
    pub usage: Option<WireUsage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamChoice {
    #[serde(default)]
    pub delta: StreamDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamDelta {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub reasoning_content: Option<String>,
    #[serde(default)]
    pub tool_calls: Vec<ToolCallDelta>,
}

/// Fragment of a tool call; fragments sharing an `index` belong together.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallDelta {
    #[serde(default)]
    pub index: usize,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub function: Option<FunctionDelta>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FunctionDelta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<String>,
}

/// Error body returned by the API on non-2xx responses
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Best-effort extraction of the API's error message.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}
