//! Multi-turn chat state shared by the REPL and one-shot `ask`.
//!
//! Each turn sends a fresh [`Conversation`] built from the system prompt,
//! an optional real-time context block, the previous user/assistant
//! exchanges and the new prompt. Only final answers are kept in history;
//! tool traffic stays inside the turn that produced it.

use crate::output::formatter::AnswerReport;
use deepseek_application::{
    ChatEventSink, ChatWithToolsInput, ChatWithToolsUseCase, OrchestrationParams, RunChatInput,
    RunChatUseCase, SamplingParams,
};
use deepseek_domain::{Conversation, Message, realtime_context};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Which use case answers a turn
pub enum ChatBackend {
    /// Orchestrated chat; the model may call tools
    Tools(ChatWithToolsUseCase),
    /// Streaming chat without tools
    Plain(RunChatUseCase),
}

pub struct ChatSession {
    backend: ChatBackend,
    sampling: SamplingParams,
    params: OrchestrationParams,
    system_prompt: Option<String>,
    realtime_context: bool,
    history: Vec<Message>,
}

impl ChatSession {
    pub fn new(backend: ChatBackend) -> Self {
        Self {
            backend,
            sampling: SamplingParams::default(),
            params: OrchestrationParams::default(),
            system_prompt: None,
            realtime_context: false,
            history: Vec::new(),
        }
    }

    pub fn with_sampling(mut self, sampling: SamplingParams) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_params(mut self, params: OrchestrationParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_system_prompt(mut self, prompt: Option<String>) -> Self {
        self.system_prompt = prompt.filter(|p| !p.trim().is_empty());
        self
    }

    pub fn with_realtime_context(mut self, enabled: bool) -> Self {
        self.realtime_context = enabled;
        self
    }

    pub fn uses_tools(&self) -> bool {
        matches!(self.backend, ChatBackend::Tools(_))
    }

    pub fn sampling(&self) -> &SamplingParams {
        &self.sampling
    }

    pub fn params(&self) -> &OrchestrationParams {
        &self.params
    }

    /// Completed exchanges (user + assistant pairs)
    pub fn turns(&self) -> usize {
        self.history.len() / 2
    }

    /// Forget previous exchanges
    pub fn reset(&mut self) {
        self.history.clear();
    }

    /// Conversation sent to the model for `prompt`.
    pub fn conversation_for(&self, prompt: &str) -> Conversation {
        let mut conversation = Conversation::new();
        if let Some(system) = &self.system_prompt {
            conversation.push(Message::system(system.clone()));
        }
        if self.realtime_context {
            conversation.push(Message::system(realtime_context(&chrono::Local::now())));
        }
        for message in &self.history {
            conversation.push(message.clone());
        }
        conversation.push(Message::user(prompt));
        conversation
    }

    /// Answer one prompt. Successful exchanges are appended to history;
    /// failed ones leave it untouched.
    pub async fn send(
        &mut self,
        prompt: &str,
        events: &dyn ChatEventSink,
        cancel: Option<CancellationToken>,
    ) -> AnswerReport {
        let conversation = self.conversation_for(prompt);
        debug!(
            messages = conversation.len(),
            tools = self.uses_tools(),
            "Sending chat turn"
        );

        let report = match &self.backend {
            ChatBackend::Tools(use_case) => {
                let mut input = ChatWithToolsInput::new(conversation)
                    .with_sampling(self.sampling.clone())
                    .with_params(self.params.clone());
                if let Some(token) = cancel {
                    input = input.with_cancellation(token);
                }
                AnswerReport::from(&use_case.execute(input, events).await)
            }
            ChatBackend::Plain(use_case) => {
                let input = RunChatInput::new(conversation, self.sampling.clone())
                    .with_extract_answer_only(self.params.extract_answer_only);
                let token = cancel.unwrap_or_default();
                tokio::select! {
                    result = use_case.execute(input, events) => match result {
                        Ok(output) => AnswerReport::from(&output),
                        Err(e) => AnswerReport::failed(e),
                    },
                    _ = token.cancelled() => AnswerReport::failed("Cancelled"),
                }
            }
        };

        if let Some(answer) = &report.answer {
            self.history.push(Message::user(prompt));
            self.history.push(Message::assistant(answer.clone()));
        }
        report
    }
}
