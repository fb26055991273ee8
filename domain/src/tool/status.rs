//! Tool health reporting
//!
//! [`ToolStatus`] is never stored; it is derived on demand from whether a
//! tool is configured and how its most recent run went.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::cache::CacheStats;

/// Health of a registered tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    Ready,
    Error,
    NotConfigured,
}

impl ToolStatus {
    /// Derive status from configuration and the last run outcome.
    ///
    /// `last_succeeded` is `None` when the tool has not run yet (or the last
    /// failure was the caller's fault, such as bad arguments).
    pub fn derive(configured: bool, last_succeeded: Option<bool>) -> Self {
        if !configured {
            ToolStatus::NotConfigured
        } else if last_succeeded == Some(false) {
            ToolStatus::Error
        } else {
            ToolStatus::Ready
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ToolStatus::Ready => "ready",
            ToolStatus::Error => "error",
            ToolStatus::NotConfigured => "not_configured",
        }
    }
}

impl std::fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-tool entry of the status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolStatusReport {
    pub name: String,
    pub status: ToolStatus,
    pub has_api_key: bool,
    pub api_key_valid: bool,
    pub cache_enabled: bool,
    /// Cache TTL in seconds
    pub cache_ttl: u64,
    pub cache_stats: CacheStats,
    pub last_used: Option<DateTime<Utc>>,
}
