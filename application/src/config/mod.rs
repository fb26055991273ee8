//! Application-level configuration.
//!
//! - [`SamplingParams`]: model and decoding parameters for each request
//! - [`OrchestrationParams`]: chat-with-tools loop control (rounds, tools per round, timeout)

pub mod orchestration_params;
pub mod sampling;

pub use orchestration_params::OrchestrationParams;
pub use sampling::SamplingParams;
