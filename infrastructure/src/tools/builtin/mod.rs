//! Built-in tools
//!
//! | Tool | Backend | Credential | Cache |
//! |------|---------|------------|-------|
//! | `calculator` | local evaluator | none | 1 h |
//! | `date_time` | system clock | none | 60 s |
//! | `weather` | OpenWeatherMap | `OPENWEATHERMAP_API_KEY` | 30 min |
//! | `web_search` | Google CSE, DuckDuckGo fallback | optional | 1 h |
//! | `wolfram_alpha` | Wolfram\|Alpha | `WOLFRAM_ALPHA_APP_ID` | 1 h |
//! | `email` | HTTP mail relay | relay key | never |
//!
//! [`BuiltinTools`] turns resolved configuration into registered tools.

pub mod calculator;
pub mod custom;
pub mod date_time;
pub mod email;
mod http;
pub mod weather;
pub mod web_search;
pub mod wolfram_alpha;

pub use calculator::{CALCULATOR, CalculatorTool};
pub use custom::{CustomTool, CustomToolBuilder, CustomToolError, ToolHandler};
pub use date_time::{DATE_TIME, DateTimeTool};
pub use email::{EMAIL, EmailConfig, EmailTool};
pub use weather::{WEATHER, WeatherConfig, WeatherTool};
pub use web_search::{WEB_SEARCH, WebSearchConfig, WebSearchTool};
pub use wolfram_alpha::{WOLFRAM_ALPHA, WolframAlphaConfig, WolframAlphaTool};

use super::registry::ToolRegistry;
use deepseek_domain::{CachePolicy, Clock, SystemClock, Tool};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// The closed set of tool kinds. Anything registered under a name that is
/// not a built-in is [`ToolKind::Custom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ToolKind {
    Calculator,
    Weather,
    DateTime,
    WebSearch,
    WolframAlpha,
    Email,
    Custom,
}

impl ToolKind {
    pub const BUILTIN: [ToolKind; 6] = [
        ToolKind::Calculator,
        ToolKind::Weather,
        ToolKind::DateTime,
        ToolKind::WebSearch,
        ToolKind::WolframAlpha,
        ToolKind::Email,
    ];

    pub fn from_name(name: &str) -> Self {
        match name {
            CALCULATOR => ToolKind::Calculator,
            WEATHER => ToolKind::Weather,
            DATE_TIME => ToolKind::DateTime,
            WEB_SEARCH => ToolKind::WebSearch,
            WOLFRAM_ALPHA => ToolKind::WolframAlpha,
            EMAIL => ToolKind::Email,
            _ => ToolKind::Custom,
        }
    }

    /// Registered name; `None` for custom tools, which bring their own.
    pub fn name(&self) -> Option<&'static str> {
        match self {
            ToolKind::Calculator => Some(CALCULATOR),
            ToolKind::Weather => Some(WEATHER),
            ToolKind::DateTime => Some(DATE_TIME),
            ToolKind::WebSearch => Some(WEB_SEARCH),
            ToolKind::WolframAlpha => Some(WOLFRAM_ALPHA),
            ToolKind::Email => Some(EMAIL),
            ToolKind::Custom => None,
        }
    }

    pub fn is_builtin(&self) -> bool {
        !matches!(self, ToolKind::Custom)
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name().unwrap_or("custom"))
    }
}

/// Per-tool switches from `[tools.<name>]`. Unset cache fields keep the
/// tool's own policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolToggle {
    pub enabled: bool,
    pub cache_enabled: Option<bool>,
    pub cache_ttl: Option<Duration>,
}

impl Default for ToolToggle {
    fn default() -> Self {
        Self {
            enabled: true,
            cache_enabled: None,
            cache_ttl: None,
        }
    }
}

impl ToolToggle {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    pub fn apply(&self, declared: CachePolicy) -> CachePolicy {
        CachePolicy {
            enabled: self.cache_enabled.unwrap_or(declared.enabled),
            ttl: self.cache_ttl.unwrap_or(declared.ttl),
        }
    }
}

/// Everything needed to construct the built-in tools.
#[derive(Clone)]
pub struct BuiltinTools {
    pub toggles: HashMap<ToolKind, ToolToggle>,
    pub weather: WeatherConfig,
    pub web_search: WebSearchConfig,
    pub wolfram_alpha: WolframAlphaConfig,
    pub email: EmailConfig,
    pub clock: Arc<dyn Clock>,
}

impl Default for BuiltinTools {
    fn default() -> Self {
        Self {
            toggles: HashMap::new(),
            weather: WeatherConfig::default(),
            web_search: WebSearchConfig::default(),
            wolfram_alpha: WolframAlphaConfig::default(),
            email: EmailConfig::default(),
            clock: Arc::new(SystemClock),
        }
    }
}

impl BuiltinTools {
    pub fn toggle(&self, kind: ToolKind) -> ToolToggle {
        self.toggles.get(&kind).copied().unwrap_or_default()
    }

    pub fn with_toggle(mut self, kind: ToolKind, toggle: ToolToggle) -> Self {
        self.toggles.insert(kind, toggle);
        self
    }

    /// Construct one built-in tool. `None` for [`ToolKind::Custom`].
    pub fn build(&self, kind: ToolKind) -> Option<Arc<dyn Tool>> {
        let tool: Arc<dyn Tool> = match kind {
            ToolKind::Calculator => Arc::new(CalculatorTool::new()),
            ToolKind::Weather => Arc::new(WeatherTool::new(self.weather.clone())),
            ToolKind::DateTime => Arc::new(DateTimeTool::with_clock(self.clock.clone())),
            ToolKind::WebSearch => Arc::new(WebSearchTool::new(self.web_search.clone())),
            ToolKind::WolframAlpha => Arc::new(WolframAlphaTool::new(self.wolfram_alpha.clone())),
            ToolKind::Email => Arc::new(EmailTool::with_clock(
                self.email.clone(),
                self.clock.clone(),
            )),
            ToolKind::Custom => return None,
        };
        Some(tool)
    }

    /// Register every enabled built-in. Returns the registered names in
    /// registration order.
    pub fn register_all(&self, registry: &ToolRegistry) -> Vec<&'static str> {
        let mut registered = Vec::new();
        for kind in ToolKind::BUILTIN {
            let toggle = self.toggle(kind);
            let (Some(name), true) = (kind.name(), toggle.enabled) else {
                debug!(tool = %kind, "Built-in tool disabled");
                continue;
            };
            let Some(tool) = self.build(kind) else {
                continue;
            };
            let policy = toggle.apply(tool.cache_policy());
            registry.register_with_policy(tool, policy);
            registered.push(name);
        }
        info!(tools = ?registered, "Registered built-in tools");
        registered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_round_trip() {
        for kind in ToolKind::BUILTIN {
            let name = kind.name().unwrap();
            assert_eq!(ToolKind::from_name(name), kind);
        }
        assert_eq!(ToolKind::from_name("shout"), ToolKind::Custom);
        assert!(!ToolKind::Custom.is_builtin());
        assert_eq!(ToolKind::Custom.to_string(), "custom");
    }

    #[test]
    fn test_register_all_respects_toggles() {
        let registry = ToolRegistry::new();
        let builtins = BuiltinTools::default()
            .with_toggle(ToolKind::Email, ToolToggle::disabled())
            .with_toggle(
                ToolKind::Calculator,
                ToolToggle {
                    cache_ttl: Some(Duration::from_secs(5)),
                    ..Default::default()
                },
            )
            .with_toggle(
                ToolKind::DateTime,
                ToolToggle {
                    cache_enabled: Some(false),
                    ..Default::default()
                },
            );

        let names = builtins.register_all(&registry);
        assert_eq!(
            names,
            vec![CALCULATOR, WEATHER, DATE_TIME, WEB_SEARCH, WOLFRAM_ALPHA]
        );
        assert!(registry.get(EMAIL).is_none());

        let report = registry.status_report();
        assert_eq!(report[CALCULATOR].cache_ttl, 5);
        assert!(report[CALCULATOR].cache_enabled);
        assert!(!report[DATE_TIME].cache_enabled);
        assert_eq!(report[WEATHER].cache_ttl, 1800);
        assert!(!report[WEATHER].has_api_key);
    }
}
