//! User-supplied tools: a [`ToolSpec`] plus an async handler closure.
//!
//! ```ignore
//! let shout = CustomTool::builder(
//!     ToolSpec::new("shout", "Upper-case a string")
//!         .with_parameter(ToolParameter::required("text", "Input", ParamType::String)),
//! )
//! .cache_policy(CachePolicy::enabled(Duration::from_secs(300)))
//! .handler(|call| async move {
//!     Ok(json!(call.get_str("text").unwrap_or_default().to_uppercase()))
//! })?;
//! registry.register(Arc::new(shout));
//! ```

use async_trait::async_trait;
use deepseek_domain::{CachePolicy, Tool, ToolError, ToolInvocation, ToolSpec};
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// Function names the chat API accepts.
const MAX_NAME_LEN: usize = 64;

pub type ToolHandler =
    Arc<dyn Fn(ToolInvocation) -> BoxFuture<'static, Result<Value, ToolError>> + Send + Sync>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CustomToolError {
    #[error("Tool name must not be empty")]
    EmptyName,

    #[error("Invalid tool name '{0}': use 1-64 letters, digits, '_' or '-'")]
    InvalidName(String),

    #[error("Tool '{tool}' declares parameter '{parameter}' more than once")]
    DuplicateParameter { tool: String, parameter: String },
}

fn check_spec(spec: &ToolSpec) -> Result<(), CustomToolError> {
    let name = &spec.name;
    if name.is_empty() {
        return Err(CustomToolError::EmptyName);
    }
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid_chars || name.len() > MAX_NAME_LEN {
        return Err(CustomToolError::InvalidName(name.clone()));
    }

    let mut seen = HashSet::new();
    for param in &spec.parameters {
        if !seen.insert(param.name.as_str()) {
            return Err(CustomToolError::DuplicateParameter {
                tool: name.clone(),
                parameter: param.name.clone(),
            });
        }
    }
    Ok(())
}

/// A tool whose behaviour is an arbitrary async closure
pub struct CustomTool {
    spec: ToolSpec,
    handler: ToolHandler,
    cache_policy: CachePolicy,
    configured: bool,
}

impl CustomTool {
    pub fn builder(spec: ToolSpec) -> CustomToolBuilder {
        CustomToolBuilder {
            spec,
            cache_policy: CachePolicy::disabled(),
            configured: true,
        }
    }
}

pub struct CustomToolBuilder {
    spec: ToolSpec,
    cache_policy: CachePolicy,
    configured: bool,
}

impl CustomToolBuilder {
    pub fn cache_policy(mut self, policy: CachePolicy) -> Self {
        self.cache_policy = policy;
        self
    }

    /// Mark the tool as unusable, e.g. when a credential it needs is absent.
    pub fn configured(mut self, configured: bool) -> Self {
        self.configured = configured;
        self
    }

    pub fn handler<F, Fut>(self, handler: F) -> Result<CustomTool, CustomToolError>
    where
        F: Fn(ToolInvocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
    {
        check_spec(&self.spec)?;
        let handler: ToolHandler = Arc::new(move |call| Box::pin(handler(call)));
        Ok(CustomTool {
            spec: self.spec,
            handler,
            cache_policy: self.cache_policy,
            configured: self.configured,
        })
    }
}

#[async_trait]
impl Tool for CustomTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn run(&self, call: &ToolInvocation) -> Result<Value, ToolError> {
        if !self.configured {
            return Err(ToolError::not_configured(format!(
                "Tool '{}' is not configured",
                self.spec.name
            )));
        }
        (self.handler)(call.clone()).await
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    fn cache_policy(&self) -> CachePolicy {
        self.cache_policy
    }
}
