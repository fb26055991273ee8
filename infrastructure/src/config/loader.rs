//! Configuration file loader with multi-source merging

use super::file_config::{ConfigIssue, FileConfig};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::PathBuf;
use thiserror::Error;

const APP_DIR: &str = "deepseek-wrapper";
const PROJECT_FILE: &str = "deepseek-wrapper.toml";
const ENV_PREFIX: &str = "DEEPSEEK_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Invalid configuration:\n{}", format_issues(.0))]
    Invalid(Vec<ConfigIssue>),
}

fn format_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(|i| format!("  {i}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. Environment: `DEEPSEEK_BASE_URL`, then `DEEPSEEK_<SECTION>__<KEY>`
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./deepseek-wrapper.toml`
    /// 4. Global: `$XDG_CONFIG_HOME/deepseek-wrapper/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, ConfigError> {
        Self::figment(config_path).extract::<FileConfig>().map_err(Box::new)?.checked()
    }

    /// Load only default configuration (for --no-config). The environment
    /// still applies.
    pub fn load_defaults() -> Result<FileConfig, ConfigError> {
        Self::with_env(Figment::new().merge(Serialized::defaults(FileConfig::default())))
            .extract::<FileConfig>()
            .map_err(Box::new)?
            .checked()
    }

    fn figment(config_path: Option<&PathBuf>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(path) = Self::project_config_path() {
            figment = figment.merge(Toml::file(path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        Self::with_env(figment)
    }

    fn with_env(figment: Figment) -> Figment {
        figment
            .merge(
                Env::prefixed(ENV_PREFIX)
                    .ignore(&["API_KEY", "BASE_URL"])
                    .split("__"),
            )
            .merge(
                Env::raw()
                    .only(&["DEEPSEEK_BASE_URL"])
                    .map(|_| "api.base_url".into()),
            )
    }

    /// Get the global config file path
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        let path = PathBuf::from(PROJECT_FILE);
        path.exists().then_some(path)
    }

    /// Print the config file locations being used (for debugging)
    pub fn print_config_sources(config_path: Option<&PathBuf>) {
        println!("Configuration sources (in priority order):");
        println!("  [ENV  ] {ENV_PREFIX}<SECTION>__<KEY>, DEEPSEEK_BASE_URL");

        if let Some(path) = config_path {
            let mark = if path.exists() { "FOUND" } else { "MISSING" };
            println!("  [{mark:<5}] Explicit: {}", path.display());
        }

        if let Some(path) = Self::project_config_path() {
            println!("  [FOUND] Project: {}", path.display());
        } else {
            println!("  [     ] Project: ./{PROJECT_FILE}");
        }

        if let Some(path) = Self::global_config_path() {
            if path.exists() {
                println!("  [FOUND] Global:  {}", path.display());
            } else {
                println!("  [     ] Global:  {}", path.display());
            }
        }

        println!("  [     ] Default: built-in defaults");
    }
}

impl FileConfig {
    /// Reject configurations with error-level issues; warnings pass through.
    pub fn checked(self) -> Result<Self, ConfigError> {
        let errors: Vec<ConfigIssue> = self
            .validate()
            .into_iter()
            .filter(ConfigIssue::is_error)
            .collect();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }
}
