//! Tool capability abstraction
//!
//! This module defines the [`Tool`] trait, the single capability interface
//! every registered tool implements, whether built in or user supplied.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     ToolRegistry                            │
//! │  (dispatch by name, cache lookup, status aggregation)       │
//! └─────────────────────────────────────────────────────────────┘
//!           │              │              │              │
//!           ▼              ▼              ▼              ▼
//!    ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌──────────┐
//!    │Calculator│   │ Weather  │   │  Email   │   │  Custom  │
//!    │ cached   │   │ cached   │   │ uncached │   │ per-tool │
//!    └──────────┘   └──────────┘   └──────────┘   └──────────┘
//! ```
//!
//! Implementors provide [`Tool::spec`] and [`Tool::run`]. Callers go
//! through [`Tool::invoke`], which validates arguments against the spec
//! and fills in defaults before `run` sees them.

use async_trait::async_trait;
use serde_json::Value;

use super::cache::CachePolicy;
use super::entities::{ToolInvocation, ToolSpec};
use super::traits::{DefaultToolValidator, ToolValidator, apply_defaults};
use super::value_objects::ToolError;

/// A named, schema-validated unit of work the model may ask for.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Static description of this tool.
    fn spec(&self) -> &ToolSpec;

    /// Name under which the tool is registered.
    fn name(&self) -> &str {
        &self.spec().name
    }

    /// Execute with already-validated arguments.
    ///
    /// Side effects (network, file I/O) belong here and nowhere else.
    async fn run(&self, call: &ToolInvocation) -> Result<Value, ToolError>;

    /// Whether the tool holds every credential it needs. Must not perform
    /// a live call.
    fn is_configured(&self) -> bool {
        true
    }

    /// Whether the tool depends on an external API key at all.
    fn requires_credentials(&self) -> bool {
        false
    }

    /// Whether the credential the tool depends on is present.
    fn has_credentials(&self) -> bool {
        false
    }

    /// Caching declared by the tool itself. Off unless overridden.
    fn cache_policy(&self) -> CachePolicy {
        CachePolicy::disabled()
    }

    /// Validate `call`, apply defaults, then [`run`](Self::run).
    async fn invoke(&self, call: &ToolInvocation) -> Result<Value, ToolError> {
        let spec = self.spec();
        DefaultToolValidator.validate(call, spec)?;
        let call = apply_defaults(call, spec);
        self.run(&call).await
    }
}
