//! LLM Gateway port
//!
//! Defines the interface for talking to a chat-completion API.

use crate::config::SamplingParams;
use async_trait::async_trait;
use deepseek_domain::{LlmResponse, Message, StreamEvent};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors that can occur during LLM gateway operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Request timed out")]
    Timeout,

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl GatewayError {
    /// Transient failures worth another attempt. Authentication failures
    /// and client errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::RateLimited(_) | GatewayError::Timeout | GatewayError::Connection(_) => {
                true
            }
            GatewayError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, GatewayError::Timeout)
    }
}

/// One chat-completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    /// Function-calling schemas; empty disables tool use.
    pub tools: Vec<Value>,
    pub sampling: SamplingParams,
}

impl ChatRequest {
    pub fn new(messages: Vec<Message>, sampling: SamplingParams) -> Self {
        Self {
            messages,
            tools: Vec::new(),
            sampling,
        }
    }

    pub fn with_tools(mut self, tools: Vec<Value>) -> Self {
        self.tools = tools;
        self
    }
}

/// Gateway for LLM communication
///
/// This port defines how the application layer talks to the model.
/// Retries and backoff on transient failures are the adapter's concern.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Send a chat request and wait for the full response.
    async fn chat(&self, request: &ChatRequest) -> Result<LlmResponse, GatewayError>;

    /// Send a chat request and receive the response incrementally.
    ///
    /// Default implementation calls `chat()` and emits the result as one
    /// delta followed by `Completed`.
    async fn chat_stream(&self, request: &ChatRequest) -> Result<StreamHandle, GatewayError> {
        let response = self.chat(request).await?;
        let (tx, rx) = mpsc::channel(2);
        let text = response.text_content();
        if !text.is_empty() {
            let _ = tx.send(StreamEvent::Delta(text)).await;
        }
        let _ = tx.send(StreamEvent::Completed(response)).await;
        Ok(StreamHandle::new(rx))
    }

    /// Plain prompt completion (no chat history).
    async fn complete(&self, prompt: &str, sampling: &SamplingParams)
    -> Result<String, GatewayError>;
}

/// Handle for receiving streaming events from a chat request.
///
/// Wraps an `mpsc::Receiver<StreamEvent>` and provides convenience methods
/// for consuming the stream.
pub struct StreamHandle {
    pub receiver: mpsc::Receiver<StreamEvent>,
}

impl StreamHandle {
    pub fn new(receiver: mpsc::Receiver<StreamEvent>) -> Self {
        Self { receiver }
    }

    pub async fn next(&mut self) -> Option<StreamEvent> {
        self.receiver.recv().await
    }

    /// Consume the stream and assemble the final response.
    pub async fn collect_response(mut self) -> Result<LlmResponse, GatewayError> {
        let mut full_text = String::new();
        while let Some(event) = self.receiver.recv().await {
            match event {
                StreamEvent::Delta(chunk) => full_text.push_str(&chunk),
                StreamEvent::ReasoningDelta(_) => {}
                StreamEvent::Completed(response) => return Ok(response),
                StreamEvent::Error(e) => return Err(GatewayError::Other(e)),
            }
        }
        // Channel closed without Completed; return what we have
        Ok(LlmResponse::from_text(full_text))
    }
}
