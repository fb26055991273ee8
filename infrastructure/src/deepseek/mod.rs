//! DeepSeek API adapter
//!
//! - [`client`]: reqwest client with retry and status mapping
//! - [`protocol`]: wire types for chat, completion and stream chunks
//! - [`stream`]: SSE decoding into [`StreamEvent`](deepseek_domain::StreamEvent)s
//! - [`gateway`]: [`LlmGateway`](deepseek_application::LlmGateway) implementation

pub mod client;
pub mod error;
pub mod gateway;
pub mod protocol;
pub mod stream;

pub use client::{API_KEY_ENV, DEFAULT_BASE_URL, DeepSeekClient, DeepSeekConfig};
pub use error::DeepSeekError;
pub use gateway::DeepSeekGateway;
