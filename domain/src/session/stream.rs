//! Streaming events for LLM chat communication.
//!
//! [`StreamEvent`] represents individual events in a streaming LLM response,
//! enabling real-time display of model output as it's generated.

use super::response::LlmResponse;

/// An event in a streaming LLM response.
///
/// Bridges the SSE chunks of the HTTP client to the application layer.
/// A well-formed stream is any number of deltas followed by exactly one
/// terminal event.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A text chunk of the answer.
    Delta(String),
    /// A chunk of reasoning emitted by reasoning models before the answer.
    ReasoningDelta(String),
    /// The full assembled response (signals stream end).
    Completed(LlmResponse),
    /// An error that occurred during streaming (signals stream end).
    Error(String),
}

impl StreamEvent {
    /// Returns the text content if this is an answer delta.
    pub fn text(&self) -> Option<&str> {
        match self {
            StreamEvent::Delta(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true if this event signals the end of the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Completed(_) | StreamEvent::Error(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_accessor() {
        assert_eq!(StreamEvent::Delta("hi".to_string()).text(), Some("hi"));
        assert_eq!(StreamEvent::ReasoningDelta("hm".to_string()).text(), None);
        assert_eq!(StreamEvent::Error("x".to_string()).text(), None);
    }

    #[test]
    fn test_terminal_events() {
        assert!(!StreamEvent::Delta("a".to_string()).is_terminal());
        assert!(!StreamEvent::ReasoningDelta("a".to_string()).is_terminal());
        assert!(StreamEvent::Completed(LlmResponse::from_text("a")).is_terminal());
        assert!(StreamEvent::Error("boom".to_string()).is_terminal());
    }
}
