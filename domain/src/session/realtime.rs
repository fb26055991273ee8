//! Current date/time context for system prompts.
//!
//! Models have no clock. Chat use cases can prepend this block so that
//! questions like "what day is it" get a grounded answer.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Value, json};

/// Date/time facts about `now`, rendered in its own timezone.
pub fn realtime_info<Tz>(now: &DateTime<Tz>) -> Value
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let utc = now.with_timezone(&Utc);
    json!({
        "current_datetime": {
            "iso": now.to_rfc3339(),
            "date": now.format("%Y-%m-%d").to_string(),
            "time": now.format("%H:%M:%S").to_string(),
            "day_of_week": now.format("%A").to_string(),
            "month": now.format("%B").to_string(),
            "year": now.format("%Y").to_string(),
            "unix_timestamp": now.timestamp(),
            "utc": utc.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        },
        "formatted": {
            "us_date": now.format("%m/%d/%Y").to_string(),
            "eu_date": now.format("%d/%m/%Y").to_string(),
            "short_date": now.format("%b %d, %Y").to_string(),
            "long_date": now.format("%B %d, %Y").to_string(),
            "time_12h": now.format("%I:%M %p").to_string(),
            "time_24h": now.format("%H:%M").to_string(),
            "day_and_date": now.format("%A, %B %d, %Y").to_string(),
        }
    })
}

/// System-prompt paragraph embedding [`realtime_info`].
pub fn realtime_context<Tz>(now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let info = serde_json::to_string_pretty(&realtime_info(now)).unwrap_or_default();
    format!("Current date and time information (use it when the user asks about dates or times):\n{info}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_realtime_info_fields() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = offset.with_ymd_and_hms(2024, 3, 15, 14, 30, 0).unwrap();
        let info = realtime_info(&now);

        assert_eq!(info["current_datetime"]["date"], "2024-03-15");
        assert_eq!(info["current_datetime"]["day_of_week"], "Friday");
        assert_eq!(info["current_datetime"]["utc"], "2024-03-15 12:30:00 UTC");
        assert_eq!(info["formatted"]["time_12h"], "02:30 PM");
        assert_eq!(info["formatted"]["day_and_date"], "Friday, March 15, 2024");
    }

    #[test]
    fn test_realtime_context_embeds_json() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let context = realtime_context(&now);
        assert!(context.starts_with("Current date and time information"));
        assert!(context.contains("\"year\": \"2024\""));
    }
}
