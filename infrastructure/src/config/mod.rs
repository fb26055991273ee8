//! Configuration loading for deepseek-wrapper
//!
//! The priority order (highest to lowest):
//!
//! 1. Environment (`DEEPSEEK_BASE_URL`, `DEEPSEEK_<SECTION>__<KEY>`)
//! 2. `--config <path>` specified file
//! 3. Project root: `./deepseek-wrapper.toml`
//! 4. Global: `$XDG_CONFIG_HOME/deepseek-wrapper/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigIssue, FileApiConfig, FileChatConfig, FileConfig, FileEmailConfig, FileLoggingConfig,
    FileOrchestrationConfig, FileToolSettings, FileToolsConfig, FileWeatherConfig,
    FileWebSearchConfig, FileWolframAlphaConfig, Severity,
};
pub use loader::{ConfigError, ConfigLoader};
