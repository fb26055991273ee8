//! Presentation-level configuration
//!
//! Settings for the interactive REPL.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// REPL configuration for the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplConfig {
    /// Show spinners and tool progress lines
    pub show_progress: bool,
    /// Path to history file; `None` keeps history in memory only
    pub history_file: Option<PathBuf>,
    /// Entries kept in the history file
    pub history_size: usize,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            show_progress: true,
            history_file: Self::default_history_path(),
            history_size: 1000,
        }
    }
}

impl ReplConfig {
    /// `<data dir>/deepseek-wrapper/history.txt`
    pub fn default_history_path() -> Option<PathBuf> {
        dirs::data_dir().map(|p| p.join("deepseek-wrapper").join("history.txt"))
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn without_history_file(mut self) -> Self {
        self.history_file = None;
        self
    }
}
