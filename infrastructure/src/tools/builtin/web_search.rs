//! `web_search` tool.
//!
//! Uses Google Custom Search when both an API key and a search engine id
//! are configured. Without them it falls back to the DuckDuckGo Instant
//! Answer API, which needs no key but only returns abstracts, definitions
//! and related topics rather than a full result listing.

use super::http::{TOOL_HTTP_TIMEOUT, check_response, http_client, read_json, transport_error};
use crate::tools::rate_limit::RateLimiter;
use async_trait::async_trait;
use chrono::Utc;
use deepseek_domain::{
    CachePolicy, ParamType, Tool, ToolError, ToolInvocation, ToolParameter, ToolSpec,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::info;

/// Canonical tool name for the web search tool.
pub const WEB_SEARCH: &str = "web_search";

pub const DEFAULT_GOOGLE_SEARCH_URL: &str = "https://www.googleapis.com/customsearch/v1";
pub const DEFAULT_DUCKDUCKGO_URL: &str = "https://api.duckduckgo.com/";
pub const SEARCH_API_KEY_ENV: &str = "SEARCH_API_KEY";
pub const SEARCH_ENGINE_ID_ENV: &str = "SEARCH_ENGINE_ID";

const GOOGLE_SOURCE: &str = "Google Custom Search";
const DUCKDUCKGO_SOURCE: &str = "DuckDuckGo";
const MAX_RELATED_TOPICS: usize = 10;

/// Resolved configuration for [`WebSearchTool`].
#[derive(Debug, Clone)]
pub struct WebSearchConfig {
    pub api_key: Option<String>,
    pub engine_id: Option<String>,
    pub google_url: String,
    pub duckduckgo_url: String,
    pub timeout: Duration,
    pub requests_per_minute: usize,
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            engine_id: None,
            google_url: DEFAULT_GOOGLE_SEARCH_URL.to_string(),
            duckduckgo_url: DEFAULT_DUCKDUCKGO_URL.to_string(),
            timeout: TOOL_HTTP_TIMEOUT,
            requests_per_minute: 10,
        }
    }
}

impl WebSearchConfig {
    pub fn with_google(mut self, api_key: impl Into<String>, engine_id: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into()).filter(|k: &String| !k.is_empty());
        self.engine_id = Some(engine_id.into()).filter(|k: &String| !k.is_empty());
        self
    }

    fn google_credentials(&self) -> Option<(&str, &str)> {
        Some((self.api_key.as_deref()?, self.engine_id.as_deref()?))
    }
}

/// One search hit, whichever backend produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
    pub snippet: String,
    pub source: String,
}

#[derive(Debug, Deserialize)]
struct GoogleResponse {
    #[serde(default)]
    items: Vec<GoogleItem>,
}

#[derive(Debug, Deserialize)]
struct GoogleItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

fn non_empty<'a>(data: &'a Value, key: &str) -> Option<&'a str> {
    data[key].as_str().filter(|s| !s.is_empty())
}

/// Turn a DuckDuckGo Instant Answer payload into hits.
///
/// Sections in order: abstract, instant answer, definition, related topics
/// (nested topic groups are skipped), redirect.
fn duckduckgo_hits(query: &str, data: &Value) -> Vec<SearchHit> {
    let hit = |title: String, link: &str, snippet: &str| SearchHit {
        title,
        link: link.to_string(),
        snippet: snippet.to_string(),
        source: DUCKDUCKGO_SOURCE.to_string(),
    };
    let mut hits = Vec::new();

    if let Some(abstract_text) = non_empty(data, "AbstractText") {
        let source = non_empty(data, "AbstractSource").unwrap_or("Unknown");
        let heading = non_empty(data, "Heading").unwrap_or(query);
        hits.push(hit(
            format!("{heading} ({source})"),
            data["AbstractURL"].as_str().unwrap_or(""),
            abstract_text,
        ));
    }

    if let Some(answer) = non_empty(data, "Answer") {
        hits.push(hit("Instant Answer".to_string(), "", answer));
    }

    if let Some(definition) = non_empty(data, "Definition") {
        let source = non_empty(data, "DefinitionSource").unwrap_or("Unknown");
        hits.push(hit(
            format!("Definition ({source})"),
            data["DefinitionURL"].as_str().unwrap_or(""),
            definition,
        ));
    }

    if let Some(topics) = data["RelatedTopics"].as_array() {
        hits.extend(
            topics
                .iter()
                .filter_map(|t| {
                    let text = non_empty(t, "Text")?;
                    let title = text.split(" - ").next().unwrap_or(text).to_string();
                    Some(hit(title, t["FirstURL"].as_str().unwrap_or(""), text))
                })
                .take(MAX_RELATED_TOPICS),
        );
    }

    if let Some(redirect) = non_empty(data, "Redirect") {
        hits.push(hit("Redirect".to_string(), redirect, redirect));
    }

    hits
}

/// Web search via Google Custom Search or DuckDuckGo
pub struct WebSearchTool {
    spec: ToolSpec,
    config: WebSearchConfig,
    http: reqwest::Client,
    limiter: RateLimiter,
}

impl WebSearchTool {
    pub fn new(config: WebSearchConfig) -> Self {
        Self {
            spec: ToolSpec::new(
                WEB_SEARCH,
                "Search the web for current information. Returns titles, links and snippets.",
            )
            .with_parameter(ToolParameter::required(
                "query",
                "The search query",
                ParamType::String,
            ))
            .with_parameter(
                ToolParameter::optional(
                    "num_results",
                    "Number of results to return (1-10)",
                    ParamType::Integer,
                )
                .with_default(3),
            )
            .with_parameter(
                ToolParameter::optional(
                    "safe_search",
                    "Filter explicit results",
                    ParamType::Boolean,
                )
                .with_default(true),
            ),
            http: http_client(config.timeout),
            limiter: RateLimiter::per_minute(config.requests_per_minute),
            config,
        }
    }

    async fn google(
        &self,
        api_key: &str,
        engine_id: &str,
        query: &str,
        num_results: usize,
        safe_search: bool,
    ) -> Result<Vec<SearchHit>, ToolError> {
        let num = num_results.to_string();
        let response = self
            .http
            .get(&self.config.google_url)
            .query(&[
                ("key", api_key),
                ("cx", engine_id),
                ("q", query),
                ("num", num.as_str()),
                ("safe", if safe_search { "active" } else { "off" }),
            ])
            .send()
            .await
            .map_err(|e| transport_error("Search", e))?;
        let response = check_response("Search", response).await?;
        let data: GoogleResponse = read_json("Search", response).await?;

        Ok(data
            .items
            .into_iter()
            .take(num_results)
            .map(|item| SearchHit {
                title: item.title,
                link: item.link,
                snippet: item.snippet,
                source: GOOGLE_SOURCE.to_string(),
            })
            .collect())
    }

    async fn duckduckgo(
        &self,
        query: &str,
        num_results: usize,
        safe_search: bool,
    ) -> Result<Vec<SearchHit>, ToolError> {
        let response = self
            .http
            .get(&self.config.duckduckgo_url)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
                ("kp", if safe_search { "1" } else { "-2" }),
            ])
            .header("User-Agent", concat!("deepseek-wrapper/", env!("CARGO_PKG_VERSION")))
            .send()
            .await
            .map_err(|e| transport_error("Search", e))?;
        let response = check_response("Search", response).await?;
        let data: Value = read_json("Search", response).await?;

        let mut hits = duckduckgo_hits(query, &data);
        hits.truncate(num_results);
        Ok(hits)
    }
}

#[async_trait]
impl Tool for WebSearchTool {
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
        let num_results = call.get_i64("num_results").unwrap_or(3).clamp(1, 10) as usize;
        let safe_search = call.get_bool("safe_search").unwrap_or(true);

        self.limiter.acquire().await;
        let results = match self.config.google_credentials() {
            Some((key, engine)) => {
                info!(query, num_results, backend = GOOGLE_SOURCE, "Searching");
                self.google(key, engine, query, num_results, safe_search).await?
            }
            None => {
                info!(query, num_results, backend = DUCKDUCKGO_SOURCE, "Searching");
                self.duckduckgo(query, num_results, safe_search).await?
            }
        };

        Ok(json!({
            "query": query,
            "num_results": results.len(),
            "results": results,
            "timestamp": Utc::now().timestamp(),
        }))
    }

    fn has_credentials(&self) -> bool {
        self.config.google_credentials().is_some()
    }

    fn cache_policy(&self) -> CachePolicy {
        CachePolicy::enabled(Duration::from_secs(3600))
    }
}
