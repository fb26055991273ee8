//! Application layer for deepseek-wrapper
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{OrchestrationParams, SamplingParams};
pub use ports::{
    chat_events::{ChannelChatEvents, ChatEventSink, NoChatEvents},
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    llm_gateway::{ChatRequest, GatewayError, LlmGateway, StreamHandle},
    tool_admin::ToolAdminPort,
    tool_executor::ToolExecutorPort,
    tool_schema::ToolSchemaPort,
};
pub use use_cases::chat_with_tools::{
    ChatWithToolsInput, ChatWithToolsOutput, ChatWithToolsUseCase, OrchestrationError,
};
pub use use_cases::run_chat::{RunChatError, RunChatInput, RunChatOutput, RunChatUseCase};
pub use use_cases::run_completion::{RunCompletionError, RunCompletionUseCase};
pub use use_cases::tool_helpers::tool_args_preview;
