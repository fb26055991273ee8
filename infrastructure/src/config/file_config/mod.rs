//! Raw TOML configuration data types
//!
//! These structs mirror the config file exactly. Every section defaults,
//! so a partial file (or none at all) is valid.

mod api;
mod logging;
mod orchestration;
mod tools;

pub use api::FileApiConfig;
pub use logging::FileLoggingConfig;
pub use orchestration::{FileChatConfig, FileOrchestrationConfig};
pub use tools::{
    FileEmailConfig, FileToolSettings, FileToolsConfig, FileWeatherConfig, FileWebSearchConfig,
    FileWolframAlphaConfig,
};

use deepseek_application::config::OrchestrationParams;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// One problem found by [`FileConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigIssue {
    pub severity: Severity,
    /// Dotted path of the offending key, e.g. `orchestration.max_rounds`
    pub field: String,
    pub message: String,
}

impl ConfigIssue {
    fn error(field: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            field: field.to_string(),
            message: message.into(),
        }
    }

    fn warning(field: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{level}: {}: {}", self.field, self.message)
    }
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub api: FileApiConfig,
    pub orchestration: FileOrchestrationConfig,
    pub chat: FileChatConfig,
    pub tools: FileToolsConfig,
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.api.base_url.trim().is_empty() {
            issues.push(ConfigIssue::error("api.base_url", "must not be empty"));
        }
        if self.api.default_model.trim().is_empty() {
            issues.push(ConfigIssue::error("api.default_model", "must not be empty"));
        }
        if self.api.max_tokens == 0 {
            issues.push(ConfigIssue::error("api.max_tokens", "must be at least 1"));
        }
        if self.api.timeout_secs == 0 {
            issues.push(ConfigIssue::error("api.timeout_secs", "must be at least 1"));
        }
        if let Some(t) = self.api.temperature
            && !(0.0..=2.0).contains(&t)
        {
            issues.push(ConfigIssue::warning(
                "api.temperature",
                format!("{t} is outside 0.0-2.0 and will likely be rejected by the API"),
            ));
        }

        if self.orchestration.max_rounds == 0 {
            issues.push(ConfigIssue::error(
                "orchestration.max_rounds",
                "must be at least 1",
            ));
        }
        if self.orchestration.max_tools_per_round == 0 {
            issues.push(ConfigIssue::error(
                "orchestration.max_tools_per_round",
                "must be at least 1",
            ));
        }

        let email = &self.tools.email;
        if email.settings.enabled && !email.dry_run && email.relay_url.is_none() {
            issues.push(ConfigIssue::warning(
                "tools.email.relay_url",
                "not set; the email tool can only render templates and save drafts",
            ));
        }

        issues
    }

    pub fn orchestration_params(&self) -> OrchestrationParams {
        self.orchestration.to_params(&self.chat)
    }
}
