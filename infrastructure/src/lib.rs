//! Infrastructure layer for deepseek-wrapper
//!
//! Adapters for the ports defined in the application layer: the DeepSeek
//! HTTP gateway, the tool registry with its built-in tools, configuration
//! file loading and the JSONL conversation log.

pub mod config;
pub mod deepseek;
pub mod logging;
pub mod tools;

// Re-export commonly used types
pub use config::{ConfigError, ConfigIssue, ConfigLoader, FileConfig};
pub use deepseek::{DeepSeekClient, DeepSeekConfig, DeepSeekError, DeepSeekGateway};
pub use logging::JsonlConversationLogger;
pub use tools::{BuiltinTools, JsonSchemaToolConverter, ToolKind, ToolRegistry};
