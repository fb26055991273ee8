//! Port for structured conversation logging.
//!
//! Records the full transcript of a session (requests, model replies,
//! tool runs) as machine-readable events, separate from `tracing`
//! diagnostics.

use serde_json::Value;

/// Event type identifiers written by the use cases.
pub mod event_types {
    pub const CHAT_REQUEST: &str = "chat_request";
    pub const LLM_RESPONSE: &str = "llm_response";
    pub const TOOL_RUN: &str = "tool_run";
    pub const SESSION_END: &str = "session_end";
    pub const COMPLETION: &str = "completion";
}

/// A structured conversation event for logging.
#[derive(Debug, Clone)]
pub struct ConversationEvent {
    /// Event type identifier (see [`event_types`]).
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl ConversationEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for logging conversation events.
///
/// `log` is synchronous and infallible; a broken log must never break a
/// chat.
pub trait ConversationLogger: Send + Sync {
    fn log(&self, event: ConversationEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}
