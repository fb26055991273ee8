//! `[logging]` section

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL file receiving one line per conversation event
    pub conversation_log: Option<PathBuf>,
    /// Diagnostic log file, rotated daily (`<name>.YYYY-MM-DD`)
    pub log_file: Option<PathBuf>,
}
