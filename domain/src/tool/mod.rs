//! Tool domain module
//!
//! Defines what a tool *is* for the chat-with-tools loop: a named,
//! described, schema-validated unit of work the model may ask for.
//!
//! ```text
//! ┌──────────────┐    ┌────────────────┐    ┌──────────────┐
//! │ ToolSpec     │───▶│ ToolInvocation │───▶│ ToolResult   │
//! │ (schema)     │    │ (model output) │    │ (tool msg)   │
//! └──────────────┘    └────────────────┘    └──────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`ToolSpec`]: name, description and parameter schema
//! - [`ToolInvocation`]: one requested call with arguments
//! - [`ToolResult`]: outcome, success or error, never a Rust error
//! - [`Tool`]: async capability trait (`spec`, `run`, `is_configured`)
//! - [`ToolValidator`]: pure argument validation
//! - [`CacheKey`] / [`CacheEntry`] / [`CacheStats`]: caching primitives
//! - [`ToolStatus`] / [`ToolStatusReport`]: derived health reporting
//!
//! # Architecture
//!
//! - **Domain** (this module): pure definitions, no I/O
//! - **Application** (`ToolExecutorPort`): port used by the orchestrator
//! - **Infrastructure** (`ToolRegistry`, built-in tools): HTTP calls,
//!   concurrent cache, panic isolation

pub mod cache;
pub mod entities;
pub mod provider;
pub mod status;
pub mod traits;
pub mod value_objects;

pub use cache::{CacheEntry, CacheKey, CachePolicy, CacheStats};
pub use entities::{ParamType, ToolInvocation, ToolParameter, ToolSpec};
pub use provider::Tool;
pub use status::{ToolStatus, ToolStatusReport};
pub use traits::{DefaultToolValidator, ToolValidator, apply_defaults};
pub use value_objects::{ToolError, ToolResult, ToolResultMetadata};
