//! Tool domain value objects: immutable result and error types
//!
//! Every tool run produces a [`ToolResult`]. Failures never escape as Rust
//! errors past the registry; they are carried inside the result as a
//! [`ToolError`] so the conversation can continue.

use crate::util::ellipsize;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error that occurred while validating or running a tool.
///
/// | Code | Raised by |
/// |------|-----------|
/// | `VALIDATION_ERROR` | Missing or mistyped arguments |
/// | `EXECUTION_FAILED` | The tool's own failure (HTTP error, bad input, panic) |
/// | `NOT_FOUND` | No tool registered under the requested name |
/// | `NOT_CONFIGURED` | Required credential is missing |
/// | `TIMEOUT` | The tool did not finish in time |
/// | `RATE_LIMITED` | Local or remote rate limit exhausted |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolError {
    /// Error code (e.g., "VALIDATION_ERROR")
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl ToolError {
    pub const VALIDATION: &'static str = "VALIDATION_ERROR";
    pub const EXECUTION_FAILED: &'static str = "EXECUTION_FAILED";
    pub const NOT_FOUND: &'static str = "NOT_FOUND";
    pub const NOT_CONFIGURED: &'static str = "NOT_CONFIGURED";
    pub const TIMEOUT: &'static str = "TIMEOUT";
    pub const RATE_LIMITED: &'static str = "RATE_LIMITED";

    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(Self::VALIDATION, message)
    }

    pub fn execution_failed(message: impl Into<String>) -> Self {
        Self::new(Self::EXECUTION_FAILED, message)
    }

    pub fn not_found(tool_name: &str) -> Self {
        Self::new(Self::NOT_FOUND, format!("Tool '{}' not found", tool_name))
    }

    pub fn not_configured(message: impl Into<String>) -> Self {
        Self::new(Self::NOT_CONFIGURED, message)
    }

    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::new(
            Self::TIMEOUT,
            format!("Operation timed out: {}", operation.into()),
        )
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(Self::RATE_LIMITED, message)
    }

    pub fn is_validation(&self) -> bool {
        self.code == Self::VALIDATION
    }

    /// Errors that say something about the tool's credentials rather than
    /// the particular request.
    pub fn is_credential_problem(&self) -> bool {
        self.code == Self::NOT_CONFIGURED
    }
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ToolError {}

/// Result of a tool execution, carrying content or error information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Name of the tool that was executed
    pub tool_name: String,
    /// Whether the execution was successful
    pub success: bool,
    /// Structured or text payload (for successful execution)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    /// Error information (for failed execution)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolError>,
    /// Metadata about the execution
    #[serde(default)]
    pub metadata: ToolResultMetadata,
}

/// Structured metadata about tool execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResultMetadata {
    /// Duration of execution in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Served from the tool cache
    #[serde(default)]
    pub cached: bool,
}

impl ToolResult {
    pub fn success(tool_name: impl Into<String>, content: impl Into<Value>) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: true,
            content: Some(content.into()),
            error: None,
            metadata: ToolResultMetadata::default(),
        }
    }

    pub fn failure(tool_name: impl Into<String>, error: ToolError) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: false,
            content: None,
            error: Some(error),
            metadata: ToolResultMetadata::default(),
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.metadata.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_cached(mut self, cached: bool) -> Self {
        self.metadata.cached = cached;
        self
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn content(&self) -> Option<&Value> {
        self.content.as_ref()
    }

    pub fn error(&self) -> Option<&ToolError> {
        self.error.as_ref()
    }

    /// Text that becomes the `tool`-role message fed back to the model.
    ///
    /// String content is passed through as-is; structured content is
    /// serialized to JSON. Failures are reported as `{"error": ...}` so the
    /// model can see what went wrong.
    pub fn to_message_content(&self) -> String {
        if self.success {
            match &self.content {
                Some(Value::String(s)) => s.clone(),
                Some(value) => value.to_string(),
                None => String::new(),
            }
        } else {
            let message = self
                .error
                .as_ref()
                .map(|e| e.message.clone())
                .unwrap_or_else(|| "unknown error".to_string());
            serde_json::json!({ "error": message }).to_string()
        }
    }

    /// Short human-readable summary, bounded to `max_bytes`.
    pub fn summary(&self, max_bytes: usize) -> String {
        let full = if self.success {
            self.to_message_content()
        } else {
            self.error
                .as_ref()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown error".to_string())
        };
        ellipsize(&full, max_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_error_display() {
        let error = ToolError::not_found("calc");
        assert_eq!(error.to_string(), "[NOT_FOUND] Tool 'calc' not found");
    }

    #[test]
    fn test_error_classification() {
        assert!(ToolError::validation("bad").is_validation());
        assert!(!ToolError::execution_failed("boom").is_validation());
        assert!(ToolError::not_configured("no key").is_credential_problem());
    }

    #[test]
    fn test_success_message_content() {
        let result = ToolResult::success("calculator", json!(84));
        assert!(result.is_success());
        assert_eq!(result.to_message_content(), "84");

        let text = ToolResult::success("search", "plain text");
        assert_eq!(text.to_message_content(), "plain text");
    }

    #[test]
    fn test_failure_message_content() {
        let result = ToolResult::failure(
            "calculator",
            ToolError::execution_failed("Division by zero"),
        );
        assert!(!result.is_success());
        let parsed: Value = serde_json::from_str(&result.to_message_content()).unwrap();
        assert_eq!(parsed["error"], "Division by zero");
    }

    #[test]
    fn test_summary_truncates() {
        let result = ToolResult::success("echo", "x".repeat(50));
        let summary = result.summary(10);
        assert_eq!(summary, format!("{}...", "x".repeat(10)));
    }

    #[test]
    fn test_metadata_builders() {
        let result = ToolResult::success("t", json!({}))
            .with_duration(12)
            .with_cached(true);
        assert_eq!(result.metadata.duration_ms, Some(12));
        assert!(result.metadata.cached);
    }
}
