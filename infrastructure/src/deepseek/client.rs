//! HTTP client for the DeepSeek API
//!
//! Thin reqwest wrapper: bearer auth, per-request timeout, status mapping
//! and retry with exponential backoff.

use reqwest::{Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use super::error::{DeepSeekError, Result};
use super::protocol::{
    ChatCompletionRequest, ChatCompletionResponse, CompletionRequest, CompletionResponse,
    error_message,
};

pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";
pub const API_KEY_ENV: &str = "DEEPSEEK_API_KEY";

/// Connection settings for [`DeepSeekClient`]
#[derive(Debug, Clone)]
pub struct DeepSeekConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry
    pub retry_backoff: Duration,
}

impl Default for DeepSeekConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_backoff: Duration::from_millis(1000),
        }
    }
}

impl DeepSeekConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }
}

/// Client for the DeepSeek REST endpoints
#[derive(Debug, Clone)]
pub struct DeepSeekClient {
    http: reqwest::Client,
    config: DeepSeekConfig,
}

impl DeepSeekClient {
    pub fn new(config: DeepSeekConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(DeepSeekError::MissingApiKey(API_KEY_ENV.to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(DeepSeekError::Http)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &DeepSeekConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.config.retry_backoff.saturating_mul(factor)
    }

    /// `POST /chat/completions` without streaming.
    pub async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        self.with_retry("chat_completion", || {
            self.post_json("chat/completions", request)
        })
        .await
    }

    /// `POST /chat/completions` with `stream: true`.
    ///
    /// Only establishing the stream is retried; the returned response body
    /// is the raw SSE byte stream.
    pub async fn chat_completion_stream(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<Response> {
        let request = request.clone().streaming();
        self.with_retry("chat_completion_stream", || {
            self.send("chat/completions", &request)
        })
        .await
    }

    /// Legacy `POST /completions`.
    pub async fn completion(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        self.with_retry("completion", || self.post_json("completions", request))
            .await
    }

    async fn with_retry<T, F, Fut>(&self, operation: &str, mut attempt_fn: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut retries = 0;
        loop {
            match attempt_fn().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && retries < self.config.max_retries => {
                    retries += 1;
                    let delay = self.backoff_delay(retries);
                    warn!(
                        operation,
                        retry = retries,
                        max_retries = self.config.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying DeepSeek request"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(path, body).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            DeepSeekError::UnexpectedResponse(format!(
                "{e}: {}",
                deepseek_domain::util::ellipsize(&text, 200)
            ))
        })
    }

    async fn send<B>(&self, path: &str, body: &B) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        debug!(url = %url, "Sending DeepSeek request");
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await?;
        check_status(response).await
    }
}

/// Map non-2xx responses to typed errors.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body);
    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => DeepSeekError::Authentication {
            status: status.as_u16(),
            message,
        },
        StatusCode::TOO_MANY_REQUESTS => DeepSeekError::RateLimited(message),
        _ => DeepSeekError::Api {
            status: status.as_u16(),
            message,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deepseek::protocol::WireMessage;
    use axum::{Json, Router, http::StatusCode as AxumStatus, routing::post};
    use deepseek_domain::Message;
    use serde_json::{Value, json};
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::net::TcpListener;

    async fn serve(app: Router) -> String {
        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client(base_url: &str) -> DeepSeekClient {
        DeepSeekClient::new(
            DeepSeekConfig::new("test-key")
                .with_base_url(base_url)
                .with_timeout(Duration::from_secs(5))
                .with_retry_backoff(Duration::from_millis(5)),
        )
        .unwrap()
    }

    fn request() -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: "deepseek-chat".into(),
            messages: vec![WireMessage::from(&Message::user("hi"))],
            max_tokens: 64,
            temperature: None,
            top_p: None,
            tools: vec![],
            stream: false,
        }
    }

    fn reply(text: &str) -> Value {
        json!({
            "model": "deepseek-chat",
            "choices": [{"message": {"role": "assistant", "content": text}, "finish_reason": "stop"}]
        })
    }

    #[test]
    fn test_missing_api_key() {
        let err = DeepSeekClient::new(DeepSeekConfig::default()).unwrap_err();
        assert!(matches!(err, DeepSeekError::MissingApiKey(_)));
    }

    #[test]
    fn test_backoff_doubles() {
        let client = DeepSeekClient::new(
            DeepSeekConfig::new("k").with_retry_backoff(Duration::from_millis(100)),
        )
        .unwrap();
        assert_eq!(client.backoff_delay(1), Duration::from_millis(100));
        assert_eq!(client.backoff_delay(2), Duration::from_millis(200));
        assert_eq!(client.backoff_delay(3), Duration::from_millis(400));
    }

    #[test]
    fn test_url_joining() {
        let client = DeepSeekClient::new(
            DeepSeekConfig::new("k").with_base_url("https://example.test/v1/"),
        )
        .unwrap();
        assert_eq!(
            client.url("chat/completions"),
            "https://example.test/v1/chat/completions"
        );
    }

    #[tokio::test]
    async fn test_chat_completion_sends_bearer_auth() {
        let app = Router::new().route(
            "/{*path}",
            post(
                |headers: axum::http::HeaderMap, Json(body): Json<Value>| async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    let echo = format!("{} {}", auth, body["messages"][0]["content"]);
                    Json(reply(&echo))
                },
            ),
        );
        let base = serve(app).await;

        let response = client(&base).chat_completion(&request()).await.unwrap();
        let response = response.into_llm_response().unwrap();
        assert_eq!(response.text_content(), "Bearer test-key \"hi\"");
    }

    #[tokio::test]
    async fn test_retries_on_rate_limit() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let app = Router::new().route(
            "/{*path}",
            post(move || {
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    if n < 2 {
                        (
                            AxumStatus::TOO_MANY_REQUESTS,
                            Json(json!({"error": {"message": "slow down"}})),
                        )
                    } else {
                        (AxumStatus::OK, Json(reply("finally")))
                    }
                }
            }),
        );
        let base = serve(app).await;

        let response = client(&base).chat_completion(&request()).await.unwrap();
        assert_eq!(response.into_llm_response().unwrap().text_content(), "finally");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let app = Router::new().route(
            "/{*path}",
            post(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    (
                        AxumStatus::SERVICE_UNAVAILABLE,
                        Json(json!({"error": {"message": "overloaded"}})),
                    )
                }
            }),
        );
        let base = serve(app).await;

        let err = client(&base).chat_completion(&request()).await.unwrap_err();
        assert!(matches!(err, DeepSeekError::Api { status: 503, .. }));
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_auth_failure_not_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let app = Router::new().route(
            "/{*path}",
            post(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    (
                        AxumStatus::UNAUTHORIZED,
                        Json(json!({"error": {"message": "Invalid API key"}})),
                    )
                }
            }),
        );
        let base = serve(app).await;

        let err = client(&base).chat_completion(&request()).await.unwrap_err();
        match err {
            DeepSeekError::Authentication { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid API key");
            }
            other => panic!("expected authentication error, got {other:?}"),
        }
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_completion_endpoint() {
        let app = Router::new().route(
            "/v1/completions",
            post(|Json(body): Json<Value>| async move {
                Json(json!({"choices": [{"text": format!("{} world", body["prompt"].as_str().unwrap_or(""))}]}))
            }),
        );
        let base = serve(app).await;

        let client = client(&format!("{base}/v1"));
        let response = client
            .completion(&CompletionRequest {
                model: "deepseek-chat".into(),
                prompt: "hello".into(),
                max_tokens: 16,
                temperature: None,
                top_p: None,
            })
            .await
            .unwrap();
        assert_eq!(response.into_text().unwrap(), "hello world");
    }
}
