//! Console output formatter

use crate::output::formatter::{AnswerReport, OutputFormatter};
use colored::Colorize;
use deepseek_domain::{ToolSpec, ToolStatus, ToolStatusReport};
use std::collections::BTreeMap;

/// Formats results for terminal display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    pub fn format_answer(report: &AnswerReport) -> String {
        let mut output = String::new();
        match (&report.answer, &report.error) {
            (Some(answer), _) => {
                output.push_str(answer.trim_end());
                output.push('\n');
            }
            (None, Some(error)) => {
                output.push_str(&format!("{} {}\n", "Error:".red().bold(), error));
            }
            (None, None) => {
                output.push_str(&format!("{}\n", "No answer".yellow()));
            }
        }

        if report.limit_reached {
            output.push_str(&format!(
                "{}\n",
                format!("(round limit reached after {} rounds)", report.rounds).yellow()
            ));
        }
        output
    }

    pub fn format_tool_list(specs: &[ToolSpec]) -> String {
        if specs.is_empty() {
            return format!("{}\n", "No tools registered".dimmed());
        }

        let mut output = String::new();
        output.push_str(&Self::header("Tools"));
        for spec in specs {
            output.push_str(&format!("\n{}\n", spec.name.cyan().bold()));
            output.push_str(&format!("{}\n", Self::indent(&spec.description, "  ")));
            for param in &spec.parameters {
                let marker = if param.required {
                    "*".red().to_string()
                } else {
                    " ".to_string()
                };
                let mut line = format!(
                    "  {}{} ({}) - {}",
                    marker, param.name, param.param_type, param.description
                );
                if let Some(values) = &param.allowed_values {
                    line.push_str(&format!(" [{}]", values.join("|")));
                }
                if let Some(default) = &param.default {
                    line.push_str(&format!(" (default: {})", default));
                }
                output.push_str(&line);
                output.push('\n');
            }
        }
        output
    }

    pub fn format_status(report: &BTreeMap<String, ToolStatusReport>) -> String {
        if report.is_empty() {
            return format!("{}\n", "No tools registered".dimmed());
        }

        let mut output = String::new();
        output.push_str(&Self::header("Tool Status"));
        output.push_str(&format!(
            "{:<16} {:<16} {:<8} {:<12} {:>8} {:>8}  {}\n",
            "TOOL", "STATUS", "API KEY", "CACHE", "HITS", "MISSES", "LAST USED"
        ));
        for (name, entry) in report {
            let status = format!("{:<16}", entry.status.as_str());
            let status = match entry.status {
                ToolStatus::Ready => status.green(),
                ToolStatus::Error => status.red(),
                ToolStatus::NotConfigured => status.yellow(),
            };
            let api_key = match (entry.has_api_key, entry.api_key_valid) {
                (false, _) => "-",
                (true, true) => "ok",
                (true, false) => "invalid",
            };
            let cache = if entry.cache_enabled {
                format!("{}s", entry.cache_ttl)
            } else {
                "off".to_string()
            };
            let last_used = entry
                .last_used
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "never".to_string());
            output.push_str(&format!(
                "{:<16} {} {:<8} {:<12} {:>8} {:>8}  {}\n",
                name,
                status,
                api_key,
                cache,
                entry.cache_stats.hits,
                entry.cache_stats.misses,
                last_used
            ));
        }
        output
    }

    pub fn format_cleared(tools: &[String]) -> String {
        if tools.is_empty() {
            format!("{}\n", "No caches cleared".dimmed())
        } else {
            format!("{} {}\n", "Cleared cache:".green(), tools.join(", "))
        }
    }

    fn header(title: &str) -> String {
        format!("{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_answer(&self, report: &AnswerReport) -> String {
        Self::format_answer(report)
    }

    fn format_tool_list(&self, specs: &[ToolSpec]) -> String {
        Self::format_tool_list(specs)
    }

    fn format_status(&self, report: &BTreeMap<String, ToolStatusReport>) -> String {
        Self::format_status(report)
    }

    fn format_cleared(&self, tools: &[String]) -> String {
        Self::format_cleared(tools)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepseek_domain::{CacheStats, ParamType, ToolParameter};

    fn no_color() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_answer_with_limit_note() {
        no_color();
        let mut report = AnswerReport::completion("It is 84.\n", "deepseek-chat");
        report.limit_reached = true;
        report.rounds = 3;
        assert_eq!(
            ConsoleFormatter::format_answer(&report),
            "It is 84.\n(round limit reached after 3 rounds)\n"
        );
    }

    #[test]
    fn test_failed_answer() {
        no_color();
        let report = AnswerReport::failed("Session timed out after 2s");
        assert_eq!(
            ConsoleFormatter::format_answer(&report),
            "Error: Session timed out after 2s\n"
        );
    }

    #[test]
    fn test_tool_list() {
        no_color();
        let spec = ToolSpec::new("weather", "Current weather")
            .with_parameter(ToolParameter::required("location", "City", ParamType::String))
            .with_parameter(
                ToolParameter::optional("units", "Unit system", ParamType::String)
                    .with_allowed_values(["metric", "imperial"])
                    .with_default("metric"),
            );
        let text = ConsoleFormatter::format_tool_list(&[spec]);
        assert!(text.contains("\nweather\n  Current weather\n"));
        assert!(text.contains("  *location (string) - City\n"));
        assert!(text.contains("units (string) - Unit system [metric|imperial] (default: \"metric\")"));
    }

    #[test]
    fn test_status_table() {
        no_color();
        let mut report = BTreeMap::new();
        report.insert(
            "weather".to_string(),
            ToolStatusReport {
                name: "weather".to_string(),
                status: ToolStatus::NotConfigured,
                has_api_key: false,
                api_key_valid: false,
                cache_enabled: true,
                cache_ttl: 1800,
                cache_stats: CacheStats { hits: 4, misses: 2 },
                last_used: None,
            },
        );
        let text = ConsoleFormatter::format_status(&report);
        let row = text.lines().find(|l| l.starts_with("weather")).unwrap();
        assert!(row.contains("not_configured"));
        assert!(row.contains("1800s"));
        assert!(row.ends_with("never"));
    }

    #[test]
    fn test_cleared() {
        no_color();
        assert_eq!(
            ConsoleFormatter::format_cleared(&["calculator".into(), "weather".into()]),
            "Cleared cache: calculator, weather\n"
        );
        assert_eq!(ConsoleFormatter::format_cleared(&[]), "No caches cleared\n");
    }
}
