//! DeepSeek LLM Gateway implementation

use async_trait::async_trait;
use deepseek_application::config::SamplingParams;
use deepseek_application::ports::llm_gateway::{ChatRequest, GatewayError, LlmGateway, StreamHandle};
use deepseek_domain::LlmResponse;
use tracing::{debug, info};

use super::client::{DeepSeekClient, DeepSeekConfig};
use super::protocol::{ChatCompletionRequest, CompletionRequest, WireMessage};
use super::stream::spawn_stream;

/// LLM Gateway backed by the DeepSeek HTTP API
#[derive(Debug, Clone)]
pub struct DeepSeekGateway {
    client: DeepSeekClient,
}

impl DeepSeekGateway {
    pub fn new(config: DeepSeekConfig) -> Result<Self, GatewayError> {
        let client = DeepSeekClient::new(config)?;
        info!(base_url = %client.config().base_url, "DeepSeekGateway initialized");
        Ok(Self { client })
    }

    pub fn with_client(client: DeepSeekClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &DeepSeekClient {
        &self.client
    }

    fn to_wire(request: &ChatRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: request.sampling.model.clone(),
            messages: request.messages.iter().map(WireMessage::from).collect(),
            max_tokens: request.sampling.max_tokens,
            temperature: request.sampling.temperature,
            top_p: request.sampling.top_p,
            tools: request.tools.clone(),
            stream: false,
        }
    }
}

#[async_trait]
impl LlmGateway for DeepSeekGateway {
    async fn chat(&self, request: &ChatRequest) -> Result<LlmResponse, GatewayError> {
        let wire = Self::to_wire(request);
        debug!(
            model = %wire.model,
            messages = wire.messages.len(),
            tools = wire.tools.len(),
            "chat request"
        );
        let response = self.client.chat_completion(&wire).await?;
        Ok(response.into_llm_response()?)
    }

    async fn chat_stream(&self, request: &ChatRequest) -> Result<StreamHandle, GatewayError> {
        let wire = Self::to_wire(request);
        debug!(model = %wire.model, messages = wire.messages.len(), "chat stream request");
        let response = self.client.chat_completion_stream(&wire).await?;
        Ok(spawn_stream(response))
    }

    async fn complete(
        &self,
        prompt: &str,
        sampling: &SamplingParams,
    ) -> Result<String, GatewayError> {
        let request = CompletionRequest {
            model: sampling.model.clone(),
            prompt: prompt.to_string(),
            max_tokens: sampling.max_tokens,
            temperature: sampling.temperature,
            top_p: sampling.top_p,
        };
        let response = self.client.completion(&request).await?;
        Ok(response.into_text()?)
    }
}
