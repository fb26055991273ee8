//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod chat_events;
pub mod conversation_logger;
pub mod llm_gateway;
pub mod tool_admin;
pub mod tool_executor;
pub mod tool_schema;
