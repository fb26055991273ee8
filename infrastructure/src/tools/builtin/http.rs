//! Error mapping shared by the HTTP-backed tools.

use deepseek_domain::{ToolError, util::ellipsize};
use reqwest::{Response, StatusCode};
use std::time::Duration;

/// Default per-request timeout for remote tool APIs.
pub const TOOL_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the client the HTTP tools share.
pub fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

pub fn transport_error(service: &str, error: reqwest::Error) -> ToolError {
    if error.is_timeout() {
        ToolError::timeout(format!("{service} request"))
    } else {
        ToolError::execution_failed(format!("{service} request failed: {error}"))
    }
}

/// Map a non-success status. 401/403 mean the credential was rejected.
pub fn status_error(service: &str, status: StatusCode, body: &str) -> ToolError {
    match status.as_u16() {
        401 | 403 => ToolError::not_configured(format!("{service} rejected the API key")),
        429 => ToolError::rate_limited(format!("{service} rate limit exceeded")),
        code => ToolError::execution_failed(format!(
            "{service} API returned status code {code}: {}",
            ellipsize(body.trim(), 200)
        )),
    }
}

/// Pass successful responses through, turn everything else into a [`ToolError`].
pub async fn check_response(service: &str, response: Response) -> Result<Response, ToolError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(service, status, &body))
}

pub async fn read_json<T: serde::de::DeserializeOwned>(
    service: &str,
    response: Response,
) -> Result<T, ToolError> {
    response.json::<T>().await.map_err(|e| {
        if e.is_timeout() {
            ToolError::timeout(format!("{service} response"))
        } else {
            ToolError::execution_failed(format!("Unexpected {service} response: {e}"))
        }
    })
}
