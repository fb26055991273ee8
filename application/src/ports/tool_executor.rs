//! Tool Executor port
//!
//! Defines how the orchestrator resolves tool calls by name.

use async_trait::async_trait;
use deepseek_domain::tool::{
    entities::{ToolInvocation, ToolSpec},
    value_objects::ToolResult,
};

/// Port for tool execution
///
/// Implementations (the tool registry) live in the infrastructure layer.
/// `run_tool` never fails: unknown tools, invalid arguments and tool
/// crashes all come back as a failed [`ToolResult`].
#[async_trait]
pub trait ToolExecutorPort: Send + Sync {
    /// Specs of all currently registered tools
    fn tool_specs(&self) -> Vec<ToolSpec>;

    /// Check if a tool is registered
    fn has_tool(&self, name: &str) -> bool {
        self.tool_specs().iter().any(|s| s.name == name)
    }

    /// Get names of all registered tools, sorted
    fn available_tools(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tool_specs().into_iter().map(|s| s.name).collect();
        names.sort();
        names
    }

    /// Run one tool invocation
    async fn run_tool(&self, call: &ToolInvocation) -> ToolResult;
}
