//! Domain layer for deepseek-wrapper
//!
//! This crate contains the core entities and value objects of the
//! chat-with-tools client. It has no dependencies on infrastructure or
//! presentation concerns.
//!
//! # Core Concepts
//!
//! ## Tools
//!
//! A [`Tool`] is a named, schema-validated capability the model may ask
//! for. Results are cached per tool under a deterministic [`CacheKey`],
//! and each tool's health is reported as a derived [`ToolStatus`].
//!
//! ## Orchestration
//!
//! A chat-with-tools session walks the [`OrchestrationState`] machine:
//! ask the model, run the tools it requests, feed results back, repeat
//! until a final answer or a limit.

pub mod core;
pub mod orchestration;
pub mod session;
pub mod tool;
pub mod util;

// Re-export commonly used types
pub use core::{
    clock::{Clock, ManualClock, SystemClock},
    error::DomainError,
};
pub use orchestration::{event::ChatEvent, state::OrchestrationState, usage::ToolUsage};
pub use session::{
    answer::{extract_final_answer, is_reasoning_model, process_model_response},
    entities::{Conversation, Message, Role},
    realtime::{realtime_context, realtime_info},
    response::{ContentBlock, LlmResponse, StopReason, TokenUsage},
    stream::StreamEvent,
};
pub use tool::{
    cache::{CacheEntry, CacheKey, CachePolicy, CacheStats, canonical_json},
    entities::{ParamType, ToolInvocation, ToolParameter, ToolSpec},
    provider::Tool,
    status::{ToolStatus, ToolStatusReport},
    traits::{DefaultToolValidator, ToolValidator, apply_defaults},
    value_objects::{ToolError, ToolResult, ToolResultMetadata},
};
