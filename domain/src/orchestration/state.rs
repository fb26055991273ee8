//! Orchestration state machine for the chat-with-tools loop.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// State of one chat-with-tools session.
///
/// ```text
/// AwaitingModel ──▶ ParsingResponse ──▶ InvokingTools ──▶ AwaitingModel
///       │                 │
///       ▼                 ├──▶ Done
///    Aborted              └──▶ Aborted
/// ```
///
/// Every non-terminal state may also move to `Aborted` (timeout,
/// cancellation).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrchestrationState {
    /// Waiting for the model to answer the current conversation
    #[default]
    AwaitingModel,
    /// Deciding between tool calls and a final answer
    ParsingResponse,
    /// Running the requested tools
    InvokingTools,
    /// Finished with an answer
    Done,
    /// Finished without an answer (remote error, timeout, limit with no text)
    Aborted,
}

impl OrchestrationState {
    pub fn as_str(&self) -> &str {
        match self {
            OrchestrationState::AwaitingModel => "AWAITING_MODEL",
            OrchestrationState::ParsingResponse => "PARSING_RESPONSE",
            OrchestrationState::InvokingTools => "INVOKING_TOOLS",
            OrchestrationState::Done => "DONE",
            OrchestrationState::Aborted => "ABORTED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrchestrationState::Done | OrchestrationState::Aborted)
    }

    pub fn can_transition_to(&self, next: OrchestrationState) -> bool {
        use OrchestrationState::*;
        match (self, next) {
            (Done | Aborted, _) => false,
            (_, Aborted) => true,
            (AwaitingModel, ParsingResponse) => true,
            (ParsingResponse, InvokingTools | Done) => true,
            (InvokingTools, AwaitingModel) => true,
            _ => false,
        }
    }

    /// Move to `next`, rejecting transitions the state machine does not allow.
    pub fn transition(self, next: OrchestrationState) -> Result<OrchestrationState, DomainError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(DomainError::InvalidTransition {
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            })
        }
    }
}

impl std::fmt::Display for OrchestrationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrchestrationState::*;

    #[test]
    fn test_happy_path_transitions() {
        let state = AwaitingModel
            .transition(ParsingResponse)
            .and_then(|s| s.transition(InvokingTools))
            .and_then(|s| s.transition(AwaitingModel))
            .and_then(|s| s.transition(ParsingResponse))
            .and_then(|s| s.transition(Done))
            .unwrap();
        assert_eq!(state, Done);
        assert!(state.is_terminal());
    }

    #[test]
    fn test_any_live_state_can_abort() {
        for state in [AwaitingModel, ParsingResponse, InvokingTools] {
            assert!(state.can_transition_to(Aborted));
        }
    }

    #[test]
    fn test_terminal_states_are_final() {
        assert!(Done.transition(AwaitingModel).is_err());
        assert!(Aborted.transition(Done).is_err());
    }

    #[test]
    fn test_rejects_skipping_parse() {
        let err = AwaitingModel.transition(InvokingTools).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid orchestration transition: AWAITING_MODEL -> INVOKING_TOOLS"
        );
    }

    #[test]
    fn test_serialization() {
        assert_eq!(serde_json::to_string(&Aborted).unwrap(), "\"ABORTED\"");
        assert_eq!(OrchestrationState::default(), AwaitingModel);
    }
}
