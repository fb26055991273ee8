//! Run Completion use case.
//!
//! Legacy single-prompt completion (`/completions` endpoint), no chat
//! history and no tools.

use crate::config::SamplingParams;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger, event_types,
};
use crate::ports::llm_gateway::{GatewayError, LlmGateway};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum RunCompletionError {
    #[error("Gateway error: {0}")]
    GatewayError(#[from] GatewayError),

    #[error("Prompt is empty")]
    EmptyPrompt,
}

pub struct RunCompletionUseCase {
    gateway: Arc<dyn LlmGateway>,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl RunCompletionUseCase {
    pub fn new(gateway: Arc<dyn LlmGateway>) -> Self {
        Self {
            gateway,
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    pub async fn execute(
        &self,
        prompt: &str,
        sampling: &SamplingParams,
    ) -> Result<String, RunCompletionError> {
        if prompt.trim().is_empty() {
            return Err(RunCompletionError::EmptyPrompt);
        }

        let text = self.gateway.complete(prompt, sampling).await?;
        info!(model = %sampling.model, bytes = text.len(), "Completion finished");

        self.conversation_logger.log(ConversationEvent::new(
            event_types::COMPLETION,
            serde_json::json!({
                "model": sampling.model,
                "prompt": prompt,
                "text": text,
            }),
        ));
        Ok(text)
    }
}
