//! `wolfram_alpha` tool over the Wolfram|Alpha Full Results API.

use super::http::{check_response, http_client, read_json, transport_error};
use crate::tools::rate_limit::RateLimiter;
use async_trait::async_trait;
use deepseek_domain::{
    CachePolicy, ParamType, Tool, ToolError, ToolInvocation, ToolParameter, ToolSpec,
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::info;

/// Canonical tool name for the Wolfram|Alpha tool.
pub const WOLFRAM_ALPHA: &str = "wolfram_alpha";

pub const DEFAULT_WOLFRAM_URL: &str = "https://api.wolframalpha.com/v2/query";
pub const WOLFRAM_APP_ID_ENV: &str = "WOLFRAM_ALPHA_APP_ID";
const SERVICE: &str = "Wolfram Alpha";

/// Resolved configuration for [`WolframAlphaTool`].
#[derive(Debug, Clone)]
pub struct WolframAlphaConfig {
    pub app_id: Option<String>,
    pub base_url: String,
    pub requests_per_minute: usize,
}

impl Default for WolframAlphaConfig {
    fn default() -> Self {
        Self {
            app_id: None,
            base_url: DEFAULT_WOLFRAM_URL.to_string(),
            requests_per_minute: 5,
        }
    }
}

impl WolframAlphaConfig {
    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into()).filter(|k: &String| !k.is_empty());
        self
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    queryresult: QueryResult,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    #[serde(default)]
    success: bool,
    /// `false`, or `{"code": ..., "msg": ...}` when the query itself failed
    #[serde(default)]
    error: Value,
    #[serde(default)]
    pods: Vec<Pod>,
}

#[derive(Debug, Deserialize)]
struct Pod {
    #[serde(default)]
    title: String,
    #[serde(default)]
    subpods: Vec<SubPod>,
}

#[derive(Debug, Deserialize)]
struct SubPod {
    #[serde(default)]
    title: String,
    #[serde(default)]
    plaintext: Option<String>,
}

fn query_error(error: &Value) -> Option<String> {
    match error {
        Value::Bool(true) => Some("Unknown error".to_string()),
        Value::Object(obj) => Some(
            obj.get("msg")
                .and_then(Value::as_str)
                .unwrap_or("Unknown error")
                .to_string(),
        ),
        _ => None,
    }
}

/// Keep pods with at least one non-empty plaintext subpod.
fn summarize(query: &str, units: &str, result: QueryResult) -> Result<Value, ToolError> {
    if let Some(message) = query_error(&result.error) {
        return Err(ToolError::execution_failed(format!(
            "Wolfram Alpha error: {message}"
        )));
    }

    let mut pods = Vec::new();
    let mut texts = Vec::new();
    for pod in result.pods {
        let subpods: Vec<Value> = pod
            .subpods
            .into_iter()
            .filter_map(|sub| {
                let text = sub.plaintext?.trim().to_string();
                (!text.is_empty()).then(|| {
                    texts.push(format!("{}: {}", pod.title, text));
                    json!({"title": sub.title, "text": text})
                })
            })
            .collect();
        if !subpods.is_empty() {
            pods.push(json!({"title": pod.title, "subpods": subpods}));
        }
    }

    Ok(json!({
        "query": query,
        "success": result.success,
        "pods": pods,
        "texts": texts,
        "units": units,
    }))
}

/// Computational knowledge queries via Wolfram|Alpha
pub struct WolframAlphaTool {
    spec: ToolSpec,
    config: WolframAlphaConfig,
    http: reqwest::Client,
    limiter: RateLimiter,
}

impl WolframAlphaTool {
    pub fn new(config: WolframAlphaConfig) -> Self {
        Self {
            spec: ToolSpec::new(
                WOLFRAM_ALPHA,
                "Ask Wolfram Alpha computational, scientific, unit conversion or factual questions",
            )
            .with_parameter(ToolParameter::required(
                "query",
                "Question in natural language or math notation",
                ParamType::String,
            ))
            .with_parameter(
                ToolParameter::optional("units", "Unit system", ParamType::String)
                    .with_allowed_values(["metric", "imperial"])
                    .with_default("metric"),
            )
            .with_parameter(
                ToolParameter::optional("timeout", "Timeout in seconds (1-30)", ParamType::Integer)
                    .with_default(10),
            ),
            http: http_client(Duration::from_secs(30)),
            limiter: RateLimiter::per_minute(config.requests_per_minute),
            config,
        }
    }
}

#[async_trait]
impl Tool for WolframAlphaTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn run(&self, call: &ToolInvocation) -> Result<Value, ToolError> {
        let query = call
            .require_str("query")
            .map_err(ToolError::validation)?
            .trim();
        if query.is_empty() {
            return Err(ToolError::validation("query must not be empty"));
        }
        let app_id = self.config.app_id.as_deref().ok_or_else(|| {
            ToolError::not_configured(format!(
                "No Wolfram Alpha App ID configured; set {WOLFRAM_APP_ID_ENV}"
            ))
        })?;
        let units = call.get_str("units").unwrap_or("metric");
        let timeout = call.get_i64("timeout").unwrap_or(10).clamp(1, 30) as u64;

        self.limiter.acquire().await;
        info!(query, units, "Querying Wolfram Alpha");
        let response = self
            .http
            .get(&self.config.base_url)
            .query(&[
                ("input", query),
                ("appid", app_id),
                ("format", "plaintext"),
                ("output", "json"),
                ("units", units),
                ("podtimeout", "2"),
                ("formattimeout", "4"),
            ])
            .timeout(Duration::from_secs(timeout))
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        let response = check_response(SERVICE, response).await?;
        let envelope: Envelope = read_json(SERVICE, response).await?;

        summarize(query, units, envelope.queryresult)
    }

    fn is_configured(&self) -> bool {
        self.has_credentials()
    }

    fn requires_credentials(&self) -> bool {
        true
    }

    fn has_credentials(&self) -> bool {
        self.config.app_id.is_some()
    }

    fn cache_policy(&self) -> CachePolicy {
        CachePolicy::enabled(Duration::from_secs(3600))
    }
}
