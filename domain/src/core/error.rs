//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Conversation has no messages")]
    EmptyConversation,

    #[error("Conversation must contain at least one user message")]
    NoUserMessage,

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Invalid orchestration transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_error_display() {
        let error = DomainError::Cancelled;
        assert_eq!(error.to_string(), "Operation cancelled");
    }

    #[test]
    fn test_is_cancelled_check() {
        assert!(DomainError::Cancelled.is_cancelled());
        assert!(!DomainError::EmptyConversation.is_cancelled());
        assert!(!DomainError::InvalidMessage("test".to_string()).is_cancelled());
    }

    #[test]
    fn test_transition_display() {
        let error = DomainError::InvalidTransition {
            from: "DONE".to_string(),
            to: "AWAITING_MODEL".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid orchestration transition: DONE -> AWAITING_MODEL"
        );
    }
}
