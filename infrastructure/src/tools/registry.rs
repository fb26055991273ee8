//! Tool Registry
//!
//! The [`ToolRegistry`] owns every registered [`Tool`], dispatches calls by
//! name and implements [`ToolExecutorPort`] for the orchestrator. It also
//! owns the process-wide [`ToolCache`] and the bookkeeping behind tool
//! status reports.
//!
//! # Usage
//!
//! ```ignore
//! use deepseek_infrastructure::tools::{ToolRegistry, builtin::CalculatorTool};
//!
//! let registry = ToolRegistry::new();
//! registry.register(Arc::new(CalculatorTool::new()));
//!
//! let call = ToolInvocation::new("calculator").with_arg("expression", "12*7");
//! let result = registry.run_tool(&call).await;
//! assert_eq!(result.content().map(|c| &c["result"]), Some(&json!(84)));
//! ```
//!
//! # Registration
//!
//! Names are unique. Registering a tool under a name that is already taken
//! replaces the previous tool (last write wins) and drops its cached
//! results, since the new tool may answer differently.
//!
//! # Failure handling
//!
//! `run_tool` never fails. Unknown tools, invalid arguments, tool errors
//! and even panics inside a tool all come back as a failed [`ToolResult`].

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deepseek_application::ports::tool_admin::ToolAdminPort;
use deepseek_application::ports::tool_executor::ToolExecutorPort;
use deepseek_domain::{
    CachePolicy, Clock, SystemClock, Tool, ToolError, ToolInvocation, ToolResult, ToolSpec,
    ToolStatus, ToolStatusReport, apply_defaults,
};
use futures::FutureExt;
use parking_lot::RwLock;
use tracing::{debug, error, info, warn};

use super::cache::ToolCache;

/// Outcome of the most recent run that says something about the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LastOutcome {
    Succeeded,
    Failed { credential_problem: bool },
}

struct RegisteredTool {
    tool: Arc<dyn Tool>,
    cache_policy: CachePolicy,
    last_used: Option<DateTime<Utc>>,
    last_outcome: Option<LastOutcome>,
}

impl RegisteredTool {
    fn new(tool: Arc<dyn Tool>, cache_policy: CachePolicy) -> Self {
        Self {
            tool,
            cache_policy,
            last_used: None,
            last_outcome: None,
        }
    }

    fn report(&self, cache: &ToolCache) -> ToolStatusReport {
        let last_succeeded = self
            .last_outcome
            .map(|outcome| outcome == LastOutcome::Succeeded);
        let has_api_key = self.tool.has_credentials();
        let key_rejected = matches!(
            self.last_outcome,
            Some(LastOutcome::Failed {
                credential_problem: true
            })
        );

        ToolStatusReport {
            name: self.tool.name().to_string(),
            status: ToolStatus::derive(self.tool.is_configured(), last_succeeded),
            has_api_key,
            api_key_valid: has_api_key && !key_rejected,
            cache_enabled: self.cache_policy.enabled,
            cache_ttl: self.cache_policy.ttl_secs(),
            cache_stats: cache.stats(self.tool.name()),
            last_used: self.last_used,
        }
    }
}

/// Registry of named tools with result caching and status tracking
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, RegisteredTool>>,
    cache: ToolCache,
    clock: Arc<dyn Clock>,
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Registry whose cache expiry and timestamps follow `clock`
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            tools: RwLock::new(HashMap::new()),
            cache: ToolCache::with_clock(clock.clone()),
            clock,
        }
    }

    /// Register a tool with its own declared cache policy.
    ///
    /// Returns the tool previously registered under the same name, if any.
    pub fn register(&self, tool: Arc<dyn Tool>) -> Option<Arc<dyn Tool>> {
        let policy = tool.cache_policy();
        self.register_with_policy(tool, policy)
    }

    /// Register a tool with a cache policy overriding its own.
    pub fn register_with_policy(
        &self,
        tool: Arc<dyn Tool>,
        cache_policy: CachePolicy,
    ) -> Option<Arc<dyn Tool>> {
        let name = tool.name().to_string();
        let previous = self
            .tools
            .write()
            .insert(name.clone(), RegisteredTool::new(tool, cache_policy));

        if previous.is_some() {
            self.cache.clear(Some(&name));
            warn!(tool = %name, "Tool re-registered; previous registration replaced");
        } else {
            debug!(
                tool = %name,
                cache = cache_policy.enabled,
                ttl_secs = cache_policy.ttl_secs(),
                "Registered tool"
            );
        }
        previous.map(|r| r.tool)
    }

    /// Remove a tool and its cached results. Returns whether it existed.
    pub fn unregister(&self, name: &str) -> bool {
        let removed = self.tools.write().remove(name).is_some();
        if removed {
            self.cache.clear(Some(name));
            info!(tool = name, "Unregistered tool");
        }
        removed
    }

    /// Names of all registered tools
    pub fn list(&self) -> BTreeSet<String> {
        self.tools.read().keys().cloned().collect()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.read().get(name).map(|r| r.tool.clone())
    }

    pub fn len(&self) -> usize {
        self.tools.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.read().is_empty()
    }

    pub fn cache(&self) -> &ToolCache {
        &self.cache
    }

    /// Run one invocation: cache lookup, then the tool itself.
    pub async fn run_tool(&self, call: &ToolInvocation) -> ToolResult {
        let name = call.tool_name.as_str();
        let Some((tool, policy)) = self
            .tools
            .read()
            .get(name)
            .map(|r| (r.tool.clone(), r.cache_policy))
        else {
            warn!(tool = name, "Unknown tool requested");
            return ToolResult::failure(name, ToolError::not_found(name));
        };

        // Key on the arguments the tool will actually see
        let keyed = apply_defaults(call, tool.spec());
        if policy.enabled
            && let Some(hit) = self.cache.get(name, &keyed.arguments)
        {
            debug!(tool = name, "Serving tool result from cache");
            self.touch(name, None);
            return hit.with_cached(true);
        }

        let started = Instant::now();
        let outcome = AssertUnwindSafe(tool.invoke(call)).catch_unwind().await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let result = match outcome {
            Ok(Ok(content)) => ToolResult::success(name, content),
            Ok(Err(e)) => {
                debug!(tool = name, error = %e, "Tool returned an error");
                ToolResult::failure(name, e)
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(tool = name, panic = %message, "Tool panicked");
                ToolResult::failure(
                    name,
                    ToolError::execution_failed(format!("Tool panicked: {message}")),
                )
            }
        }
        .with_duration(duration_ms);

        if result.is_success() && policy.enabled {
            self.cache
                .put(name, &keyed.arguments, result.clone(), policy.ttl);
        }

        // Bad arguments are the caller's fault and say nothing about the tool
        let outcome = match result.error() {
            None => Some(LastOutcome::Succeeded),
            Some(e) if e.is_validation() => None,
            Some(e) => Some(LastOutcome::Failed {
                credential_problem: e.is_credential_problem(),
            }),
        };
        self.touch(name, outcome);

        result
    }

    fn touch(&self, name: &str, outcome: Option<LastOutcome>) {
        let now = self.clock.now();
        if let Some(registered) = self.tools.write().get_mut(name) {
            registered.last_used = Some(now);
            if outcome.is_some() {
                registered.last_outcome = outcome;
            }
        }
    }

    /// Clear the cache of one tool, or of every tool.
    ///
    /// Returns the affected tool names: the named tool if it is registered,
    /// otherwise every registered tool with caching enabled.
    pub fn clear_cache(&self, name: Option<&str>) -> Vec<String> {
        match name {
            Some(name) => {
                if !self.tools.read().contains_key(name) {
                    return Vec::new();
                }
                self.cache.clear(Some(name));
                info!(tool = name, "Tool cache cleared");
                vec![name.to_string()]
            }
            None => {
                self.cache.clear(None);
                let mut affected: Vec<String> = self
                    .tools
                    .read()
                    .iter()
                    .filter(|(_, r)| r.cache_policy.enabled)
                    .map(|(name, _)| name.clone())
                    .collect();
                affected.sort();
                info!(tools = ?affected, "All tool caches cleared");
                affected
            }
        }
    }

    /// Forget cached results, counters and run history for every tool.
    pub fn reset(&self) {
        self.cache.clear(None);
        for registered in self.tools.write().values_mut() {
            registered.last_used = None;
            registered.last_outcome = None;
        }
        info!("Tool registry reset");
    }

    /// Derived status of every registered tool, keyed by name.
    pub fn status_report(&self) -> BTreeMap<String, ToolStatusReport> {
        self.tools
            .read()
            .iter()
            .map(|(name, registered)| (name.clone(), registered.report(&self.cache)))
            .collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[async_trait]
impl ToolExecutorPort for ToolRegistry {
    fn tool_specs(&self) -> Vec<ToolSpec> {
        let mut specs: Vec<ToolSpec> = self
            .tools
            .read()
            .values()
            .map(|r| r.tool.spec().clone())
            .collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
    }

    fn has_tool(&self, name: &str) -> bool {
        self.tools.read().contains_key(name)
    }

    async fn run_tool(&self, call: &ToolInvocation) -> ToolResult {
        ToolRegistry::run_tool(self, call).await
    }
}

impl ToolAdminPort for ToolRegistry {
    fn status_report(&self) -> BTreeMap<String, ToolStatusReport> {
        ToolRegistry::status_report(self)
    }

    fn clear_cache(&self, tool: Option<&str>) -> Vec<String> {
        ToolRegistry::clear_cache(self, tool)
    }
}
