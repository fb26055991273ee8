//! JSON output for scripts (`--output json`)

use crate::output::formatter::{AnswerReport, OutputFormatter};
use deepseek_domain::{ToolSpec, ToolStatusReport};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;

pub struct JsonFormatter;

impl JsonFormatter {
    fn render<T: Serialize + ?Sized>(value: &T) -> String {
        let mut text = serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string());
        text.push('\n');
        text
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_answer(&self, report: &AnswerReport) -> String {
        Self::render(report)
    }

    fn format_tool_list(&self, specs: &[ToolSpec]) -> String {
        Self::render(specs)
    }

    fn format_status(&self, report: &BTreeMap<String, ToolStatusReport>) -> String {
        Self::render(report)
    }

    fn format_cleared(&self, tools: &[String]) -> String {
        Self::render(&json!({ "cleared": tools }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn parse(text: &str) -> Value {
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn test_answer_omits_empty_fields() {
        let value = parse(&JsonFormatter.format_answer(&AnswerReport::completion("hi", "deepseek-chat")));
        assert_eq!(value["answer"], "hi");
        assert_eq!(value["state"], "DONE");
        assert_eq!(value["model"], "deepseek-chat");
        assert!(value.get("tool_usage").is_none());
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_failed_answer() {
        let value = parse(&JsonFormatter.format_answer(&AnswerReport::failed("Cancelled")));
        assert!(value["answer"].is_null());
        assert_eq!(value["state"], "ABORTED");
        assert_eq!(value["error"], "Cancelled");
    }

    #[test]
    fn test_cleared() {
        let value = parse(&JsonFormatter.format_cleared(&["weather".to_string()]));
        assert_eq!(value, json!({"cleared": ["weather"]}));
    }
}
