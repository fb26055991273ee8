//! Tool schema conversion port.
//!
//! Separates "which tools exist" (domain [`ToolSpec`]) from "how the API
//! wants them described" (infrastructure).

use deepseek_domain::tool::entities::ToolSpec;

/// Port for converting tool specs to the model's function-calling format.
pub trait ToolSchemaPort: Send + Sync {
    /// Convert a single tool spec to its API schema.
    fn tool_to_schema(&self, spec: &ToolSpec) -> serde_json::Value;

    /// Convert all specs, sorted by name for stable prompts.
    fn tools_schema(&self, specs: &[ToolSpec]) -> Vec<serde_json::Value> {
        let mut sorted: Vec<&ToolSpec> = specs.iter().collect();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));
        sorted.into_iter().map(|s| self.tool_to_schema(s)).collect()
    }
}
