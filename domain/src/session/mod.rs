//! Chat session domain.
//!
//! - [`entities::Message`] / [`entities::Conversation`]: role-tagged, append-only history
//! - [`response::LlmResponse`]: assistant text plus optional tool calls
//! - [`stream::StreamEvent`]: incremental streaming output
//! - [`answer`]: final-answer extraction for reasoning models
//! - [`realtime`]: current date/time context for system prompts

pub mod answer;
pub mod entities;
pub mod realtime;
pub mod response;
pub mod stream;
