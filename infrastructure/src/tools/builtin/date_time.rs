//! `date_time` tool: current date and time in a requested zone.
//!
//! Zones are `local`, `UTC` or a fixed offset (`+05:30`, `UTC-8`).

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Local, Offset, Utc};
use deepseek_domain::{
    CachePolicy, Clock, ParamType, SystemClock, Tool, ToolError, ToolInvocation, ToolParameter,
    ToolSpec, realtime_info,
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

/// Canonical tool name for the date/time tool.
pub const DATE_TIME: &str = "date_time";

const FORMATS: [&str; 5] = ["iso", "full", "date_only", "time_only", "unix"];

/// Resolve a zone name to a fixed offset plus a display label.
fn resolve_timezone(name: &str, now_utc: DateTime<Utc>) -> Result<(FixedOffset, String), ToolError> {
    let trimmed = name.trim();
    let lower = trimmed.to_ascii_lowercase();

    if lower.is_empty() || lower == "local" {
        let offset = *now_utc.with_timezone(&Local).offset();
        return Ok((offset, format!("local ({offset})")));
    }
    if matches!(lower.as_str(), "utc" | "gmt" | "z") {
        return Ok((Utc.fix(), "UTC".to_string()));
    }

    let offset_text = lower
        .strip_prefix("utc")
        .or_else(|| lower.strip_prefix("gmt"))
        .unwrap_or(&lower);
    parse_offset(offset_text)
        .map(|offset| (offset, format!("UTC{offset}")))
        .ok_or_else(|| {
            ToolError::validation(format!(
                "Unknown timezone '{trimmed}'; use 'local', 'UTC' or an offset like '+05:30'"
            ))
        })
}

/// `+5`, `-08`, `+0530`, `+05:30`
fn parse_offset(text: &str) -> Option<FixedOffset> {
    let (sign, rest) = match text.as_bytes().first()? {
        b'+' => (1, &text[1..]),
        b'-' => (-1, &text[1..]),
        _ => return None,
    };
    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None if rest.len() == 4 => rest.split_at(2),
        None => (rest, "0"),
    };
    if hours.is_empty() || !hours.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 14 || minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn render(now: &DateTime<FixedOffset>, format: &str, timezone: &str) -> Value {
    match format {
        "iso" => json!({
            "iso": now.to_rfc3339(),
            "timezone": timezone,
        }),
        "date_only" => json!({
            "date": now.format("%Y-%m-%d").to_string(),
            "day_of_week": now.format("%A").to_string(),
            "month": now.format("%B").to_string(),
            "year": now.format("%Y").to_string(),
            "us_date": now.format("%m/%d/%Y").to_string(),
            "eu_date": now.format("%d/%m/%Y").to_string(),
            "timezone": timezone,
        }),
        "time_only" => json!({
            "time": now.format("%H:%M:%S").to_string(),
            "time_12h": now.format("%I:%M:%S %p").to_string(),
            "time_24h": now.format("%H:%M").to_string(),
            "timezone": timezone,
        }),
        "unix" => json!({
            "unix_timestamp": now.timestamp(),
            "timezone": timezone,
        }),
        _ => {
            let mut info = realtime_info(now);
            if let Some(object) = info.as_object_mut() {
                object.insert("timezone".to_string(), json!(timezone));
            }
            info
        }
    }
}

/// Current date/time tool
pub struct DateTimeTool {
    spec: ToolSpec,
    clock: Arc<dyn Clock>,
}

impl DateTimeTool {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            spec: ToolSpec::new(
                DATE_TIME,
                "Get the current date and time, optionally in a specific timezone",
            )
            .with_parameter(
                ToolParameter::optional(
                    "timezone",
                    "'local', 'UTC' or a UTC offset such as '+05:30'",
                    ParamType::String,
                )
                .with_default("local"),
            )
            .with_parameter(
                ToolParameter::optional("format", "Output format", ParamType::String)
                    .with_allowed_values(FORMATS)
                    .with_default("full"),
            ),
            clock,
        }
    }
}

impl Default for DateTimeTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for DateTimeTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn run(&self, call: &ToolInvocation) -> Result<Value, ToolError> {
        let now_utc = self.clock.now();
        let (offset, label) = resolve_timezone(call.get_str("timezone").unwrap_or("local"), now_utc)?;
        let now = now_utc.with_timezone(&offset);
        Ok(render(&now, call.get_str("format").unwrap_or("full"), &label))
    }

    fn cache_policy(&self) -> CachePolicy {
        CachePolicy::enabled(Duration::from_secs(60))
    }
}
