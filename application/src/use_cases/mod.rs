//! Use cases (application services)

pub mod chat_with_tools;
pub mod run_chat;
pub mod run_completion;
pub mod tool_helpers;
