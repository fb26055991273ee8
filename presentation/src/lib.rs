//! Presentation layer for deepseek-wrapper
//!
//! This crate contains CLI definitions, output formatters, the console
//! event sink and the interactive chat interface.

pub mod chat;
pub mod cli;
pub mod config;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use chat::{ChatBackend, ChatRepl, ChatSession, ReplCommand};
pub use cli::commands::{Cli, Command, OutputFormat, ToolSelector, ToolsCommand};
pub use config::ReplConfig;
pub use output::console::ConsoleFormatter;
pub use output::formatter::{AnswerReport, OutputFormatter};
pub use output::formatter_for;
pub use output::json::JsonFormatter;
pub use progress::reporter::ConsoleEventSink;
