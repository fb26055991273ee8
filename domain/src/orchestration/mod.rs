//! Chat-with-tools orchestration domain
//!
//! - [`state::OrchestrationState`]: the loop's state machine
//! - [`usage::ToolUsage`]: ordered record of tools run in a session
//! - [`event::ChatEvent`]: typed events for incremental display

pub mod event;
pub mod state;
pub mod usage;
