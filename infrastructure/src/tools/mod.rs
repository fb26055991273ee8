//! Tool infrastructure
//!
//! Concrete tools and the machinery that runs them:
//!
//! - [`ToolRegistry`]: dispatch by name, caching, panic isolation, status
//! - [`ToolCache`]: per-tool TTL cache shared by all sessions
//! - [`RateLimiter`]: sliding window for remote APIs
//! - [`JsonSchemaToolConverter`]: specs to chat API function schemas
//! - [`builtin`]: calculator, weather, date/time, web search,
//!   Wolfram|Alpha, email and custom tools

pub mod builtin;

mod cache;
mod rate_limit;
mod registry;
mod schema;

pub use builtin::{BuiltinTools, ToolKind, ToolToggle};
pub use cache::ToolCache;
pub use rate_limit::RateLimiter;
pub use registry::ToolRegistry;
pub use schema::JsonSchemaToolConverter;
