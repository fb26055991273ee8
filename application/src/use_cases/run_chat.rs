//! Run Chat use case.
//!
//! Plain streaming chat without tools. Deltas are forwarded to the event
//! sink as they arrive; reasoning models may additionally have their answer
//! trimmed once the stream is complete.

use crate::config::SamplingParams;
use crate::ports::chat_events::ChatEventSink;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger, event_types,
};
use crate::ports::llm_gateway::{ChatRequest, GatewayError, LlmGateway};
use deepseek_domain::{ChatEvent, Conversation, DomainError, StreamEvent, process_model_response};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur during a plain chat.
#[derive(Error, Debug)]
pub enum RunChatError {
    #[error("Gateway error: {0}")]
    GatewayError(#[from] GatewayError),

    #[error("Invalid conversation: {0}")]
    InvalidConversation(#[from] DomainError),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("No response from model")]
    EmptyResponse,
}

/// Input for the [`RunChatUseCase`].
#[derive(Debug, Clone)]
pub struct RunChatInput {
    pub conversation: Conversation,
    pub sampling: SamplingParams,
    /// Trim reasoning-model output down to the final answer.
    pub extract_answer_only: bool,
}

impl RunChatInput {
    pub fn new(conversation: Conversation, sampling: SamplingParams) -> Self {
        Self {
            conversation,
            sampling,
            extract_answer_only: false,
        }
    }

    pub fn with_extract_answer_only(mut self, enabled: bool) -> Self {
        self.extract_answer_only = enabled;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunChatOutput {
    /// Answer after optional extraction
    pub answer: String,
    /// Everything the model streamed
    pub full_text: String,
    /// Separate chain-of-thought from reasoning models
    pub reasoning: Option<String>,
    pub model: String,
    /// `answer` differs from `full_text`
    pub replaced: bool,
}

/// Use case for a streaming chat turn.
pub struct RunChatUseCase {
    gateway: Arc<dyn LlmGateway>,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl Clone for RunChatUseCase {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            conversation_logger: self.conversation_logger.clone(),
        }
    }
}

impl RunChatUseCase {
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
        input: RunChatInput,
        events: &dyn ChatEventSink,
    ) -> Result<RunChatOutput, RunChatError> {
        let result = self.stream_turn(input, events).await;
        if let Err(e) = &result {
            events.emit(ChatEvent::Error {
                message: e.to_string(),
            });
        }
        result
    }

    async fn stream_turn(
        &self,
        input: RunChatInput,
        events: &dyn ChatEventSink,
    ) -> Result<RunChatOutput, RunChatError> {
        input.conversation.validate()?;
        if let Some(user) = input.conversation.last_user_message() {
            events.emit(ChatEvent::UserReceived {
                content: user.content.clone(),
            });
        }
        events.emit(ChatEvent::AssistantStart { round: 1 });

        let request = ChatRequest::new(input.conversation.into_messages(), input.sampling.clone());
        self.conversation_logger.log(ConversationEvent::new(
            event_types::CHAT_REQUEST,
            serde_json::json!({
                "model": input.sampling.model,
                "messages": request.messages.len(),
                "tools": 0,
            }),
        ));
        debug!(model = %input.sampling.model, "Starting chat stream");

        let mut stream = self.gateway.chat_stream(&request).await?;
        let mut text = String::new();
        let mut reasoning = String::new();
        let mut completed = None;

        while let Some(event) = stream.next().await {
            match event {
                StreamEvent::Delta(chunk) => {
                    events.emit(ChatEvent::ContentChunk {
                        content: chunk.clone(),
                    });
                    text.push_str(&chunk);
                }
                StreamEvent::ReasoningDelta(chunk) => reasoning.push_str(&chunk),
                StreamEvent::Completed(response) => {
                    completed = Some(response);
                    break;
                }
                StreamEvent::Error(message) => return Err(RunChatError::Stream(message)),
            }
        }

        let mut model = input.sampling.model.clone();
        if let Some(response) = completed {
            if text.is_empty() {
                text = response.text_content();
                if !text.is_empty() {
                    events.emit(ChatEvent::ContentChunk {
                        content: text.clone(),
                    });
                }
            }
            if reasoning.is_empty()
                && let Some(r) = response.reasoning
            {
                reasoning = r;
            }
            if let Some(m) = response.model {
                model = m;
            }
        }

        if text.trim().is_empty() {
            return Err(RunChatError::EmptyResponse);
        }

        let answer = process_model_response(&text, &model, input.extract_answer_only);
        let replaced = answer != text;
        if replaced {
            events.emit(ChatEvent::ReplaceContent {
                content: answer.clone(),
            });
        }
        events.emit(ChatEvent::Complete {
            content: answer.clone(),
            tool_usage: Vec::new(),
        });

        info!(model = %model, bytes = text.len(), replaced, "Chat completed");
        self.conversation_logger.log(ConversationEvent::new(
            event_types::LLM_RESPONSE,
            serde_json::json!({
                "model": model,
                "text": text,
                "reasoning_bytes": reasoning.len(),
            }),
        ));

        Ok(RunChatOutput {
            answer,
            full_text: text,
            reasoning: (!reasoning.is_empty()).then_some(reasoning),
            model,
            replaced,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::chat_events::ChannelChatEvents;
    use crate::ports::llm_gateway::StreamHandle;
    use async_trait::async_trait;
    use deepseek_domain::{LlmResponse, Message};
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    /// Streams the scripted events verbatim.
    struct ScriptedGateway {
        script: Mutex<Option<Vec<StreamEvent>>>,
    }

    impl ScriptedGateway {
        fn new(script: Vec<StreamEvent>) -> Self {
            Self {
                script: Mutex::new(Some(script)),
            }
        }
    }

    #[async_trait]
    impl LlmGateway for ScriptedGateway {
        async fn chat(&self, _request: &ChatRequest) -> Result<LlmResponse, GatewayError> {
            Err(GatewayError::Other("use chat_stream".to_string()))
        }

        async fn chat_stream(&self, _request: &ChatRequest) -> Result<StreamHandle, GatewayError> {
            let script = self
                .script
                .lock()
                .unwrap()
                .take()
                .ok_or_else(|| GatewayError::Other("script consumed".to_string()))?;
            let (tx, rx) = mpsc::channel(script.len().max(1));
            for event in script {
                tx.send(event).await.unwrap();
            }
            Ok(StreamHandle::new(rx))
        }

        async fn complete(
            &self,
            _prompt: &str,
            _sampling: &SamplingParams,
        ) -> Result<String, GatewayError> {
            Err(GatewayError::Other("not used".to_string()))
        }
    }

    fn chat_input(model: &str) -> RunChatInput {
        let conversation = Conversation::from_messages(vec![Message::user("How far is 120 km at 60 km/h?")]);
        RunChatInput::new(conversation, SamplingParams::default().with_model(model))
    }

    #[tokio::test]
    async fn test_streams_chunks_in_order() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            StreamEvent::Delta("Two ".to_string()),
            StreamEvent::Delta("hours.".to_string()),
            StreamEvent::Completed(LlmResponse::from_text("Two hours.").with_model("deepseek-chat")),
        ]));
        let (sink, mut rx) = ChannelChatEvents::new();
        let output = RunChatUseCase::new(gateway)
            .execute(chat_input("deepseek-chat"), &sink)
            .await
            .unwrap();

        assert_eq!(output.answer, "Two hours.");
        assert!(!output.replaced);

        let mut chunks = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let ChatEvent::ContentChunk { content } = event {
                chunks.push(content);
            }
        }
        assert_eq!(chunks, vec!["Two ", "hours."]);
    }

    #[tokio::test]
    async fn test_reasoning_model_answer_is_replaced() {
        let mut completed = LlmResponse::from_text("ignored").with_model("deepseek-reasoner");
        completed.reasoning = Some("distance over speed".to_string());
        let gateway = Arc::new(ScriptedGateway::new(vec![
            StreamEvent::ReasoningDelta("distance over speed".to_string()),
            StreamEvent::Delta("We divide 120 by 60.\n\nAnswer: 2 hours".to_string()),
            StreamEvent::Completed(completed),
        ]));
        let (sink, mut rx) = ChannelChatEvents::new();
        let output = RunChatUseCase::new(gateway)
            .execute(
                chat_input("deepseek-reasoner").with_extract_answer_only(true),
                &sink,
            )
            .await
            .unwrap();

        assert_eq!(output.answer, "2 hours");
        assert!(output.replaced);
        assert_eq!(output.reasoning.as_deref(), Some("distance over speed"));
        assert!(output.full_text.starts_with("We divide"));

        let mut saw_replace = false;
        while let Ok(event) = rx.try_recv() {
            if event == (ChatEvent::ReplaceContent { content: "2 hours".to_string() }) {
                saw_replace = true;
            }
        }
        assert!(saw_replace);
    }

    #[tokio::test]
    async fn test_stream_error_is_reported() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            StreamEvent::Delta("Par".to_string()),
            StreamEvent::Error("connection reset".to_string()),
        ]));
        let (sink, mut rx) = ChannelChatEvents::new();
        let err = RunChatUseCase::new(gateway)
            .execute(chat_input("deepseek-chat"), &sink)
            .await
            .unwrap_err();

        assert!(matches!(err, RunChatError::Stream(ref m) if m == "connection reset"));
        let mut last = None;
        while let Ok(event) = rx.try_recv() {
            last = Some(event);
        }
        assert!(matches!(last, Some(ChatEvent::Error { .. })));
    }

    #[tokio::test]
    async fn test_empty_response() {
        let gateway = Arc::new(ScriptedGateway::new(vec![StreamEvent::Completed(
            LlmResponse::from_text(""),
        )]));
        let (sink, _rx) = ChannelChatEvents::new();
        let err = RunChatUseCase::new(gateway)
            .execute(chat_input("deepseek-chat"), &sink)
            .await
            .unwrap_err();
        assert!(matches!(err, RunChatError::EmptyResponse));
    }
}
