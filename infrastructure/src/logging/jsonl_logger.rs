//! Append-only JSONL file of conversation events.
//!
//! One line per [`ConversationEvent`]: the payload's fields plus `type`,
//! `session` and an RFC 3339 `timestamp`. Several sessions may share a
//! file; `session` tells them apart.

use chrono::SecondsFormat;
use deepseek_application::ports::conversation_logger::{ConversationEvent, ConversationLogger};
use deepseek_domain::{Clock, SystemClock};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct JsonlConversationLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
    session: String,
    clock: Arc<dyn Clock>,
}

impl JsonlConversationLogger {
    /// Open `path` for appending, creating it and its parent directories.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        Self::open_with_clock(path, Arc::new(SystemClock))
    }

    pub fn open_with_clock(path: impl AsRef<Path>, clock: Arc<dyn Clock>) -> io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let session = clock.now().format("%Y%m%dT%H%M%S%.3fZ").to_string();
        debug!(path = %path.display(), session = %session, "Conversation log opened");

        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
            session,
            clock,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Identifier stamped on every line written by this logger.
    pub fn session(&self) -> &str {
        &self.session
    }

    fn record(&self, event: ConversationEvent) -> Value {
        let mut map = match event.payload {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => Map::from_iter([("data".to_string(), other)]),
        };
        map.insert("type".to_string(), Value::from(event.event_type));
        map.insert("session".to_string(), Value::from(self.session.as_str()));
        map.insert(
            "timestamp".to_string(),
            Value::from(self.clock.now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        Value::Object(map)
    }
}

impl ConversationLogger for JsonlConversationLogger {
    fn log(&self, event: ConversationEvent) {
        let event_type = event.event_type;
        let line = match serde_json::to_string(&self.record(event)) {
            Ok(line) => line,
            Err(e) => {
                warn!(event = event_type, error = %e, "Unserializable conversation event");
                return;
            }
        };

        let mut writer = self.writer.lock();
        // Flushed per line so a crash loses at most the event in flight
        if let Err(e) = writeln!(writer, "{line}").and_then(|_| writer.flush()) {
            warn!(path = %self.path.display(), error = %e, "Failed to write conversation log");
        }
    }
}

impl Drop for JsonlConversationLogger {
    fn drop(&mut self) {
        let _ = self.writer.get_mut().flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use deepseek_application::ports::conversation_logger::event_types;
    use deepseek_domain::ManualClock;
    use serde_json::json;

    fn read_lines(path: &Path) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    fn fixed_clock() -> Arc<dyn Clock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap(),
        ))
    }

    #[test]
    fn test_writes_one_object_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("chat.jsonl");
        let logger = JsonlConversationLogger::open_with_clock(&path, fixed_clock()).unwrap();

        logger.log(ConversationEvent::new(
            event_types::LLM_RESPONSE,
            json!({"model": "deepseek-chat", "text": "84"}),
        ));
        logger.log(ConversationEvent::new(
            event_types::TOOL_RUN,
            json!({"tool": "calculator", "success": true}),
        ));
        drop(logger);

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["type"], "llm_response");
        assert_eq!(lines[0]["model"], "deepseek-chat");
        assert_eq!(lines[0]["timestamp"], "2024-03-15T12:00:00.000Z");
        assert_eq!(lines[0]["session"], "20240315T120000.000Z");
        assert_eq!(lines[1]["tool"], "calculator");
    }

    #[test]
    fn test_non_object_payload_wrapped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.jsonl");
        let logger = JsonlConversationLogger::open(&path).unwrap();

        logger.log(ConversationEvent::new(event_types::COMPLETION, json!("just text")));
        logger.log(ConversationEvent::new(event_types::SESSION_END, Value::Null));
        drop(logger);

        let lines = read_lines(&path);
        assert_eq!(lines[0]["data"], "just text");
        assert_eq!(lines[1]["type"], "session_end");
        assert!(lines[1].get("data").is_none());
    }

    #[test]
    fn test_appends_across_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.jsonl");

        for _ in 0..2 {
            let logger = JsonlConversationLogger::open(&path).unwrap();
            logger.log(ConversationEvent::new(event_types::CHAT_REQUEST, json!({})));
        }

        assert_eq!(read_lines(&path).len(), 2);
    }

    #[test]
    fn test_open_fails_when_parent_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();

        assert!(JsonlConversationLogger::open(blocker.join("chat.jsonl")).is_err());
    }
}
