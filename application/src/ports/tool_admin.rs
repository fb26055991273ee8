//! Tool administration port
//!
//! Read-only health reporting and cache management for front ends (the
//! `/status` and `/clear-cache` REPL commands, `tools status`).

use deepseek_domain::ToolStatusReport;
use std::collections::BTreeMap;

pub trait ToolAdminPort: Send + Sync {
    /// Derived status of every registered tool, keyed by name
    fn status_report(&self) -> BTreeMap<String, ToolStatusReport>;

    /// Clear one tool's cache, or every cache when `tool` is `None`.
    /// Returns the affected tool names.
    fn clear_cache(&self, tool: Option<&str>) -> Vec<String>;
}
