//! `[tools]` section
//!
//! ```toml
//! [tools]
//! enabled = true
//!
//! [tools.calculator]
//! cache_ttl_secs = 600
//!
//! [tools.weather]
//! api_key_env = "OPENWEATHERMAP_API_KEY"
//!
//! [tools.email]
//! enabled = false
//! relay_url = "https://mail.example.com/send"
//! ```
//!
//! Secrets never live in the file; each section names the environment
//! variable to read them from.

use crate::tools::builtin::{
    BuiltinTools, EmailConfig, ToolKind, ToolToggle, WeatherConfig, WebSearchConfig,
    WolframAlphaConfig, email, weather, web_search, wolfram_alpha,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Fields every `[tools.<name>]` table accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileToolSettings {
    pub enabled: bool,
    pub cache_enabled: Option<bool>,
    pub cache_ttl_secs: Option<u64>,
}

impl Default for FileToolSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            cache_enabled: None,
            cache_ttl_secs: None,
        }
    }
}

impl FileToolSettings {
    pub fn to_toggle(&self) -> ToolToggle {
        ToolToggle {
            enabled: self.enabled,
            cache_enabled: self.cache_enabled,
            cache_ttl: self.cache_ttl_secs.map(Duration::from_secs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileWeatherConfig {
    #[serde(flatten)]
    pub settings: FileToolSettings,
    pub api_key_env: String,
    pub base_url: String,
    pub requests_per_minute: usize,
}

impl Default for FileWeatherConfig {
    fn default() -> Self {
        let defaults = WeatherConfig::default();
        Self {
            settings: FileToolSettings::default(),
            api_key_env: weather::WEATHER_API_KEY_ENV.to_string(),
            base_url: defaults.base_url,
            requests_per_minute: defaults.requests_per_minute,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileWebSearchConfig {
    #[serde(flatten)]
    pub settings: FileToolSettings,
    pub api_key_env: String,
    /// Variable holding the Google Custom Search engine id
    pub engine_id_env: String,
    pub requests_per_minute: usize,
}

impl Default for FileWebSearchConfig {
    fn default() -> Self {
        Self {
            settings: FileToolSettings::default(),
            api_key_env: web_search::SEARCH_API_KEY_ENV.to_string(),
            engine_id_env: web_search::SEARCH_ENGINE_ID_ENV.to_string(),
            requests_per_minute: WebSearchConfig::default().requests_per_minute,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileWolframAlphaConfig {
    #[serde(flatten)]
    pub settings: FileToolSettings,
    pub api_key_env: String,
    pub requests_per_minute: usize,
}

impl Default for FileWolframAlphaConfig {
    fn default() -> Self {
        Self {
            settings: FileToolSettings::default(),
            api_key_env: wolfram_alpha::WOLFRAM_APP_ID_ENV.to_string(),
            requests_per_minute: WolframAlphaConfig::default().requests_per_minute,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEmailConfig {
    #[serde(flatten)]
    pub settings: FileToolSettings,
    pub relay_url: Option<String>,
    pub api_key_env: String,
    pub sender: Option<String>,
    pub template_dir: Option<PathBuf>,
    pub daily_limit: u32,
    pub dry_run: bool,
}

impl Default for FileEmailConfig {
    fn default() -> Self {
        Self {
            settings: FileToolSettings::default(),
            relay_url: None,
            api_key_env: email::EMAIL_RELAY_KEY_ENV.to_string(),
            sender: None,
            template_dir: None,
            daily_limit: email::DEFAULT_DAILY_LIMIT,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileToolsConfig {
    /// Master switch; `false` behaves like `--no-tools`
    pub enabled: bool,
    pub calculator: FileToolSettings,
    pub date_time: FileToolSettings,
    pub weather: FileWeatherConfig,
    pub web_search: FileWebSearchConfig,
    pub wolfram_alpha: FileWolframAlphaConfig,
    pub email: FileEmailConfig,
}

impl Default for FileToolsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            calculator: FileToolSettings::default(),
            date_time: FileToolSettings::default(),
            weather: FileWeatherConfig::default(),
            web_search: FileWebSearchConfig::default(),
            wolfram_alpha: FileWolframAlphaConfig::default(),
            email: FileEmailConfig::default(),
        }
    }
}

impl FileToolsConfig {
    pub fn settings(&self, kind: ToolKind) -> Option<&FileToolSettings> {
        match kind {
            ToolKind::Calculator => Some(&self.calculator),
            ToolKind::DateTime => Some(&self.date_time),
            ToolKind::Weather => Some(&self.weather.settings),
            ToolKind::WebSearch => Some(&self.web_search.settings),
            ToolKind::WolframAlpha => Some(&self.wolfram_alpha.settings),
            ToolKind::Email => Some(&self.email.settings),
            ToolKind::Custom => None,
        }
    }

    /// Resolve secrets through `env` and build the tool set.
    pub fn to_builtin_tools(&self, env: impl Fn(&str) -> Option<String>) -> BuiltinTools {
        let secret = |name: &str| env(name).filter(|v| !v.trim().is_empty());

        let toggles = ToolKind::BUILTIN
            .into_iter()
            .filter_map(|kind| {
                let toggle = if self.enabled {
                    self.settings(kind)?.to_toggle()
                } else {
                    ToolToggle::disabled()
                };
                Some((kind, toggle))
            })
            .collect();

        BuiltinTools {
            toggles,
            weather: WeatherConfig {
                api_key: secret(&self.weather.api_key_env),
                base_url: self.weather.base_url.clone(),
                requests_per_minute: self.weather.requests_per_minute,
                ..Default::default()
            },
            web_search: WebSearchConfig {
                api_key: secret(&self.web_search.api_key_env),
                engine_id: secret(&self.web_search.engine_id_env),
                requests_per_minute: self.web_search.requests_per_minute,
                ..Default::default()
            },
            wolfram_alpha: WolframAlphaConfig {
                app_id: secret(&self.wolfram_alpha.api_key_env),
                requests_per_minute: self.wolfram_alpha.requests_per_minute,
                ..Default::default()
            },
            email: EmailConfig {
                relay_url: self.email.relay_url.clone(),
                api_key: secret(&self.email.api_key_env),
                sender: self.email.sender.clone(),
                template_dir: self.email.template_dir.clone(),
                daily_limit: self.email.daily_limit,
                dry_run: self.email.dry_run,
            },
            ..Default::default()
        }
    }
}
