//! Chat-with-tools use case.
//!
//! Drives a bounded number of model rounds over one conversation. Each round
//! the model either answers (session is `Done`) or asks for tools, which are
//! run concurrently through the [`ToolExecutorPort`] and fed back as
//! tool-role messages before the next round.
//!
//! Tool failures never end the session; they come back as error results the
//! model can react to. Remote model failures always do.

use crate::config::{OrchestrationParams, SamplingParams};
use crate::ports::chat_events::ChatEventSink;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger, event_types,
};
use crate::ports::llm_gateway::{ChatRequest, GatewayError, LlmGateway};
use crate::ports::tool_executor::ToolExecutorPort;
use crate::ports::tool_schema::ToolSchemaPort;
use crate::use_cases::tool_helpers::tool_args_preview;
use deepseek_domain::util::truncate_str;
use deepseek_domain::{
    ChatEvent, Conversation, DomainError, Message, OrchestrationState, ToolUsage,
    process_model_response,
};
use serde_json::{Value, json};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Why a chat-with-tools session ended without an answer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrchestrationError {
    #[error("Remote model error: {0}")]
    RemoteModel(#[from] GatewayError),

    #[error("Session timed out after {0:?}")]
    Timeout(Duration),

    #[error("Round limit reached after {rounds} rounds without an assistant answer")]
    LimitExceeded { rounds: usize },

    #[error("Invalid conversation: {0}")]
    InvalidConversation(#[from] DomainError),

    #[error("Cancelled")]
    Cancelled,
}

impl OrchestrationError {
    /// True for the overall session timeout and for a timed-out model call.
    pub fn is_timeout(&self) -> bool {
        match self {
            OrchestrationError::Timeout(_) => true,
            OrchestrationError::RemoteModel(e) => e.is_timeout(),
            _ => false,
        }
    }
}

/// Input for the [`ChatWithToolsUseCase`].
#[derive(Debug, Clone)]
pub struct ChatWithToolsInput {
    pub conversation: Conversation,
    pub sampling: SamplingParams,
    pub params: OrchestrationParams,
    /// Aborts the session when triggered.
    pub cancel: Option<CancellationToken>,
}

impl ChatWithToolsInput {
    pub fn new(conversation: Conversation) -> Self {
        Self {
            conversation,
            sampling: SamplingParams::default(),
            params: OrchestrationParams::default(),
            cancel: None,
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

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Result of one chat-with-tools session.
#[derive(Debug, Clone)]
pub struct ChatWithToolsOutput {
    /// Terminal state: `Done` or `Aborted`
    pub state: OrchestrationState,
    /// Final answer (present iff `state` is `Done`)
    pub answer: Option<String>,
    /// Every tool run, in order
    pub usage_log: Vec<ToolUsage>,
    /// Model calls made
    pub rounds: usize,
    /// The round limit cut the session short
    pub limit_reached: bool,
    /// Cause of an `Aborted` session
    pub error: Option<OrchestrationError>,
    /// The conversation including every message appended during the session
    pub conversation: Conversation,
}

impl ChatWithToolsOutput {
    pub fn is_done(&self) -> bool {
        self.state == OrchestrationState::Done
    }

    /// Collapse into the answer or the abort cause.
    pub fn into_result(self) -> Result<String, OrchestrationError> {
        match (self.answer, self.error) {
            (Some(answer), _) => Ok(answer),
            (None, Some(error)) => Err(error),
            (None, None) => Err(OrchestrationError::LimitExceeded {
                rounds: self.rounds,
            }),
        }
    }
}

/// Mutable bookkeeping for one session.
struct Session {
    state: OrchestrationState,
    conversation: Conversation,
    usage_log: Vec<ToolUsage>,
    rounds: usize,
    limit_reached: bool,
    model: Option<String>,
    /// Latest non-empty assistant text produced in this session. Earlier
    /// turns carried in the input conversation do not count.
    last_text: Option<String>,
}

impl Session {
    fn new(conversation: Conversation) -> Self {
        Self {
            state: OrchestrationState::default(),
            conversation,
            usage_log: Vec::new(),
            rounds: 0,
            limit_reached: false,
            model: None,
            last_text: None,
        }
    }

    fn advance(&mut self, next: OrchestrationState) {
        match self.state.transition(next) {
            Ok(state) => self.state = state,
            Err(e) => warn!(error = %e, "Ignoring invalid orchestration transition"),
        }
    }

    fn finish(self, answer: Option<String>, error: Option<OrchestrationError>) -> ChatWithToolsOutput {
        ChatWithToolsOutput {
            state: self.state,
            answer,
            usage_log: self.usage_log,
            rounds: self.rounds,
            limit_reached: self.limit_reached,
            error,
            conversation: self.conversation,
        }
    }
}

/// Use case for a tool-augmented chat session.
///
/// Flow per round:
/// 1. Send the conversation plus tool schemas to the model
/// 2. No tool calls: the reply text is the answer
/// 3. Tool calls (capped per round): run them in parallel, append one
///    tool-role message per result, go to 1
///
/// At most `max_rounds` model calls are made. If the last allowed reply
/// still asks for tools, those tools are not run and the session ends with
/// the latest assistant text (or `LimitExceeded` if there is none).
pub struct ChatWithToolsUseCase {
    gateway: Arc<dyn LlmGateway>,
    tool_executor: Arc<dyn ToolExecutorPort>,
    tool_schema: Arc<dyn ToolSchemaPort>,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl Clone for ChatWithToolsUseCase {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            tool_executor: self.tool_executor.clone(),
            tool_schema: self.tool_schema.clone(),
            conversation_logger: self.conversation_logger.clone(),
        }
    }
}

impl ChatWithToolsUseCase {
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        tool_executor: Arc<dyn ToolExecutorPort>,
        tool_schema: Arc<dyn ToolSchemaPort>,
    ) -> Self {
        Self {
            gateway,
            tool_executor,
            tool_schema,
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    /// Create with a conversation logger.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    /// Run one session to a terminal state.
    ///
    /// Never returns an error directly: an aborted session is reported
    /// through [`ChatWithToolsOutput::error`] and a final
    /// [`ChatEvent::Error`].
    pub async fn execute(
        &self,
        input: ChatWithToolsInput,
        events: &dyn ChatEventSink,
    ) -> ChatWithToolsOutput {
        let ChatWithToolsInput {
            conversation,
            sampling,
            params,
            cancel,
        } = input;

        let mut session = Session::new(conversation);

        if let Err(e) = session.conversation.validate() {
            return self.abort(session, OrchestrationError::from(e), events);
        }

        if let Some(user) = session.conversation.last_user_message() {
            info!(
                "Starting chat with tools: {}",
                truncate_str(&user.content, 100)
            );
            events.emit(ChatEvent::UserReceived {
                content: user.content.clone(),
            });
        }

        let tools = self
            .tool_schema
            .tools_schema(&self.tool_executor.tool_specs());
        debug!(
            model = %sampling.model,
            tools = tools.len(),
            max_rounds = params.max_rounds,
            "Chat session configured"
        );

        let outcome = {
            let run = with_deadline(
                self.drive(&mut session, &tools, &sampling, &params, events),
                params.timeout,
            );
            match cancel {
                Some(token) => tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(OrchestrationError::Cancelled),
                    result = run => result,
                },
                None => run.await,
            }
        };

        match outcome {
            Ok(text) => {
                let model = session
                    .model
                    .clone()
                    .unwrap_or_else(|| sampling.model.clone());
                let answer = process_model_response(&text, &model, params.extract_answer_only);
                if answer != text {
                    events.emit(ChatEvent::ReplaceContent {
                        content: answer.clone(),
                    });
                }

                info!(
                    rounds = session.rounds,
                    tools_used = session.usage_log.len(),
                    limit_reached = session.limit_reached,
                    "Chat with tools completed"
                );
                events.emit(ChatEvent::Complete {
                    content: answer.clone(),
                    tool_usage: session.usage_log.clone(),
                });
                self.log_session_end(&session);
                session.finish(Some(answer), None)
            }
            Err(e) => self.abort(session, e, events),
        }
    }

    fn abort(
        &self,
        mut session: Session,
        error: OrchestrationError,
        events: &dyn ChatEventSink,
    ) -> ChatWithToolsOutput {
        session.advance(OrchestrationState::Aborted);
        warn!(
            rounds = session.rounds,
            tools_used = session.usage_log.len(),
            "Chat with tools aborted: {}",
            error
        );
        events.emit(ChatEvent::Error {
            message: error.to_string(),
        });
        self.log_session_end(&session);
        session.finish(None, Some(error))
    }

    /// Round loop. Returns the answer text; the caller owns terminal
    /// bookkeeping for the error path.
    async fn drive(
        &self,
        session: &mut Session,
        tools: &[Value],
        sampling: &SamplingParams,
        params: &OrchestrationParams,
        events: &dyn ChatEventSink,
    ) -> Result<String, OrchestrationError> {
        let max_rounds = params.max_rounds.max(1);
        let max_tools = params.max_tools_per_round.max(1);

        loop {
            session.rounds += 1;
            let round = session.rounds;
            events.emit(ChatEvent::AssistantStart { round });

            let request = ChatRequest::new(
                session.conversation.messages().to_vec(),
                sampling.clone(),
            )
            .with_tools(tools.to_vec());

            self.conversation_logger.log(ConversationEvent::new(
                event_types::CHAT_REQUEST,
                json!({
                    "round": round,
                    "model": sampling.model,
                    "messages": request.messages.len(),
                    "tools": request.tools.len(),
                }),
            ));
            debug!(round, messages = request.messages.len(), "Requesting model");

            let response = self.gateway.chat(&request).await?;
            session.advance(OrchestrationState::ParsingResponse);
            if let Some(model) = &response.model {
                session.model = Some(model.clone());
            }

            let text = response.text_content();
            if !text.is_empty() {
                events.emit(ChatEvent::ContentChunk {
                    content: text.clone(),
                });
            }

            if !text.trim().is_empty() {
                session.last_text = Some(text.clone());
            }

            let mut calls = response.tool_calls();
            self.conversation_logger.log(ConversationEvent::new(
                event_types::LLM_RESPONSE,
                json!({
                    "round": round,
                    "model": response.model,
                    "text": text,
                    "tool_calls": calls.len(),
                }),
            ));

            if calls.is_empty() {
                let answer = session.last_text.clone().unwrap_or_default();
                session.conversation.push(Message::assistant(text));
                session.advance(OrchestrationState::Done);
                return Ok(answer);
            }

            if round >= max_rounds {
                session.limit_reached = true;
                warn!(
                    "Round limit ({}) reached with {} pending tool calls",
                    max_rounds,
                    calls.len()
                );
                if !text.trim().is_empty() {
                    session.conversation.push(Message::assistant(text));
                }
                return match session.last_text.clone() {
                    Some(answer) => {
                        session.advance(OrchestrationState::Done);
                        Ok(answer)
                    }
                    None => Err(OrchestrationError::LimitExceeded { rounds: round }),
                };
            }

            if calls.len() > max_tools {
                warn!(
                    "Model requested {} tools in round {}; running the first {}",
                    calls.len(),
                    round,
                    max_tools
                );
                calls.truncate(max_tools);
            }

            for (i, call) in calls.iter_mut().enumerate() {
                if call.id.as_deref().is_none_or(str::is_empty) {
                    call.id = Some(format!("call_{}_{}", round, i + 1));
                }
            }

            session
                .conversation
                .push(Message::assistant_with_tools(text, calls.clone()));
            session.advance(OrchestrationState::InvokingTools);

            for call in &calls {
                debug!(
                    round,
                    tool = %call.tool_name,
                    "Running tool ({})",
                    tool_args_preview(&call.arguments_json())
                );
                events.emit(ChatEvent::ToolInvoked {
                    round,
                    tool: call.tool_name.clone(),
                    arguments: call.arguments_json(),
                });
            }

            let results = futures::future::join_all(
                calls.iter().map(|call| self.tool_executor.run_tool(call)),
            )
            .await;

            for (call, result) in calls.iter().zip(results) {
                let usage = ToolUsage::record(round, call, &result);
                if !usage.success {
                    debug!(tool = %call.tool_name, "Tool failed: {}", usage.summary);
                }
                events.emit(ChatEvent::ToolCompleted {
                    round,
                    tool: usage.tool.clone(),
                    success: usage.success,
                    summary: usage.summary.clone(),
                });
                self.conversation_logger.log(ConversationEvent::new(
                    event_types::TOOL_RUN,
                    json!({
                        "round": round,
                        "tool": usage.tool,
                        "arguments": usage.arguments,
                        "success": usage.success,
                        "cached": usage.cached,
                        "summary": usage.summary,
                    }),
                ));
                session.usage_log.push(usage);
                session
                    .conversation
                    .push(Message::tool(&result, call.id.clone()));
            }

            session.advance(OrchestrationState::AwaitingModel);
        }
    }

    fn log_session_end(&self, session: &Session) {
        self.conversation_logger.log(ConversationEvent::new(
            event_types::SESSION_END,
            json!({
                "state": session.state.as_str(),
                "rounds": session.rounds,
                "limit_reached": session.limit_reached,
                "tools_used": session.usage_log.len(),
            }),
        ));
    }
}

async fn with_deadline<F>(run: F, timeout: Option<Duration>) -> Result<String, OrchestrationError>
where
    F: Future<Output = Result<String, OrchestrationError>>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, run)
            .await
            .map_err(|_| OrchestrationError::Timeout(limit))?,
        None => run.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::chat_events::{ChannelChatEvents, NoChatEvents};
    use async_trait::async_trait;
    use deepseek_domain::{
        ContentBlock, LlmResponse, ParamType, Role, StopReason, ToolError, ToolInvocation,
        ToolParameter, ToolResult, ToolSpec,
    };
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    // ==================== Test Mocks ====================

    struct MockGateway {
        responses: Mutex<VecDeque<Result<LlmResponse, GatewayError>>>,
        requests: Mutex<Vec<ChatRequest>>,
        delay: Option<Duration>,
    }

    impl MockGateway {
        fn new(responses: Vec<Result<LlmResponse, GatewayError>>) -> Self {
            Self {
                responses: Mutex::new(VecDeque::from(responses)),
                requests: Mutex::new(Vec::new()),
                delay: None,
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LlmGateway for MockGateway {
        async fn chat(&self, request: &ChatRequest) -> Result<LlmResponse, GatewayError> {
            self.requests.lock().unwrap().push(request.clone());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(GatewayError::Other("No more responses".to_string())))
        }

        async fn complete(
            &self,
            _prompt: &str,
            _sampling: &SamplingParams,
        ) -> Result<String, GatewayError> {
            Err(GatewayError::Other("not used".to_string()))
        }
    }

    /// Calculator and weather stand-ins.
    struct MockTools {
        runs: Mutex<Vec<String>>,
    }

    impl MockTools {
        fn new() -> Self {
            Self {
                runs: Mutex::new(Vec::new()),
            }
        }

        fn run_count(&self) -> usize {
            self.runs.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ToolExecutorPort for MockTools {
        fn tool_specs(&self) -> Vec<ToolSpec> {
            vec![
                ToolSpec::new("calculator", "Evaluate math").with_parameter(
                    ToolParameter::required("expression", "Expression", ParamType::String),
                ),
                ToolSpec::new("weather", "Current weather").with_parameter(
                    ToolParameter::required("location", "City", ParamType::String),
                ),
            ]
        }

        async fn run_tool(&self, call: &ToolInvocation) -> ToolResult {
            self.runs.lock().unwrap().push(call.tool_name.clone());
            match (call.tool_name.as_str(), call.get_str("expression")) {
                ("calculator", Some("12*7")) => ToolResult::success("calculator", json!(84)),
                ("calculator", Some("1/0")) => ToolResult::failure(
                    "calculator",
                    ToolError::execution_failed("Division by zero"),
                ),
                ("weather", _) => ToolResult::success(
                    "weather",
                    json!({"location": "Paris", "temperature": 18.5, "units": "metric"}),
                ),
                (name, _) => ToolResult::failure(name, ToolError::not_found(name)),
            }
        }
    }

    struct MockToolSchema;

    impl ToolSchemaPort for MockToolSchema {
        fn tool_to_schema(&self, spec: &ToolSpec) -> Value {
            json!({"type": "function", "function": {"name": spec.name}})
        }
    }

    fn text_response(text: &str) -> Result<LlmResponse, GatewayError> {
        Ok(LlmResponse::from_text(text).with_model("deepseek-chat"))
    }

    fn tool_response(text: &str, calls: &[(&str, &str, &str, &str)]) -> Result<LlmResponse, GatewayError> {
        let mut content = Vec::new();
        if !text.is_empty() {
            content.push(ContentBlock::Text(text.to_string()));
        }
        for (id, name, key, value) in calls {
            content.push(ContentBlock::ToolUse {
                id: id.to_string(),
                name: name.to_string(),
                input: HashMap::from([(key.to_string(), json!(value))]),
            });
        }
        Ok(LlmResponse {
            content,
            reasoning: None,
            stop_reason: Some(StopReason::ToolUse),
            model: Some("deepseek-chat".to_string()),
            usage: None,
        })
    }

    fn use_case(gateway: Arc<MockGateway>, tools: Arc<MockTools>) -> ChatWithToolsUseCase {
        ChatWithToolsUseCase::new(gateway, tools, Arc::new(MockToolSchema))
    }

    fn input(question: &str) -> ChatWithToolsInput {
        let mut conversation = Conversation::new();
        conversation.push(Message::user(question));
        ChatWithToolsInput::new(conversation)
    }

    fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<ChatEvent>) -> Vec<ChatEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    // ==================== Tests ====================

    #[tokio::test]
    async fn test_answer_without_tools() {
        let gateway = Arc::new(MockGateway::new(vec![text_response("Hello!")]));
        let tools = Arc::new(MockTools::new());
        let output = use_case(gateway.clone(), tools.clone())
            .execute(input("hi"), &NoChatEvents)
            .await;

        assert_eq!(output.state, OrchestrationState::Done);
        assert_eq!(output.answer.as_deref(), Some("Hello!"));
        assert_eq!(output.rounds, 1);
        assert!(output.usage_log.is_empty());
        assert_eq!(tools.run_count(), 0);
        assert_eq!(gateway.request_count(), 1);
    }

    #[tokio::test]
    async fn test_calculator_and_weather_in_one_round() {
        let gateway = Arc::new(MockGateway::new(vec![
            tool_response(
                "",
                &[
                    ("call_a", "calculator", "expression", "12*7"),
                    ("call_b", "weather", "location", "Paris"),
                ],
            ),
            text_response("12*7 is 84 and Paris is 18.5°C."),
        ]));
        let tools = Arc::new(MockTools::new());
        let output = use_case(gateway.clone(), tools.clone())
            .execute(input("What's 12*7 and the weather in Paris?"), &NoChatEvents)
            .await;

        assert!(output.is_done());
        assert_eq!(output.rounds, 2);
        assert_eq!(output.usage_log.len(), 2);
        assert_eq!(output.usage_log[0].tool, "calculator");
        assert_eq!(output.usage_log[0].arguments, json!({"expression": "12*7"}));
        assert_eq!(output.usage_log[0].summary, "84");
        assert_eq!(output.usage_log[1].tool, "weather");
        assert!(output.usage_log[1].summary.contains("temperature"));
        assert_eq!(
            output.answer.as_deref(),
            Some("12*7 is 84 and Paris is 18.5°C.")
        );

        // user, assistant(tool calls), tool, tool, assistant
        let roles: Vec<Role> = output
            .conversation
            .messages()
            .iter()
            .map(|m| m.role)
            .collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::Tool, Role::Tool, Role::Assistant]
        );
        assert_eq!(
            output.conversation.messages()[2].tool_call_id.as_deref(),
            Some("call_a")
        );

        // Second request carries the tool results
        let requests = gateway.requests.lock().unwrap();
        assert_eq!(requests[1].messages.len(), 4);
        assert_eq!(requests[0].tools.len(), 2);
    }

    #[tokio::test]
    async fn test_tool_error_does_not_abort() {
        let gateway = Arc::new(MockGateway::new(vec![
            tool_response("", &[("c1", "calculator", "expression", "1/0")]),
            text_response("Division by zero is undefined."),
        ]));
        let tools = Arc::new(MockTools::new());
        let output = use_case(gateway, tools)
            .execute(input("What is 1/0?"), &NoChatEvents)
            .await;

        assert_eq!(output.state, OrchestrationState::Done);
        assert_eq!(output.usage_log.len(), 1);
        assert!(!output.usage_log[0].success);
        assert!(output.usage_log[0].summary.contains("Division by zero"));

        let tool_message = &output.conversation.messages()[2];
        assert_eq!(tool_message.role, Role::Tool);
        assert!(tool_message.content.contains("Division by zero"));
    }

    #[tokio::test]
    async fn test_remote_timeout_on_first_round_aborts() {
        let gateway = Arc::new(MockGateway::new(vec![Err(GatewayError::Timeout)]));
        let tools = Arc::new(MockTools::new());
        let (sink, mut rx) = ChannelChatEvents::new();
        let output = use_case(gateway, tools).execute(input("hi"), &sink).await;

        assert_eq!(output.state, OrchestrationState::Aborted);
        assert!(output.usage_log.is_empty());
        assert!(output.answer.is_none());
        let error = output.error.clone().unwrap();
        assert!(error.is_timeout());
        assert_eq!(error, OrchestrationError::RemoteModel(GatewayError::Timeout));

        let events = drain(&mut rx);
        assert!(matches!(events.last(), Some(ChatEvent::Error { .. })));
        assert!(output.into_result().is_err());
    }

    #[tokio::test]
    async fn test_auth_error_aborts_after_tools() {
        let gateway = Arc::new(MockGateway::new(vec![
            tool_response("", &[("c1", "calculator", "expression", "12*7")]),
            Err(GatewayError::Authentication("invalid key".to_string())),
        ]));
        let tools = Arc::new(MockTools::new());
        let output = use_case(gateway, tools)
            .execute(input("12*7?"), &NoChatEvents)
            .await;

        assert_eq!(output.state, OrchestrationState::Aborted);
        assert_eq!(output.usage_log.len(), 1);
        assert!(matches!(
            output.error,
            Some(OrchestrationError::RemoteModel(GatewayError::Authentication(_)))
        ));
    }

    #[tokio::test]
    async fn test_overall_timeout_aborts() {
        let gateway = Arc::new(
            MockGateway::new(vec![text_response("too late")])
                .with_delay(Duration::from_millis(500)),
        );
        let tools = Arc::new(MockTools::new());
        let params = OrchestrationParams::default().with_timeout(Some(Duration::from_millis(50)));
        let output = use_case(gateway, tools)
            .execute(input("hi").with_params(params), &NoChatEvents)
            .await;

        assert_eq!(output.state, OrchestrationState::Aborted);
        assert_eq!(
            output.error,
            Some(OrchestrationError::Timeout(Duration::from_millis(50)))
        );
    }

    #[tokio::test]
    async fn test_round_limit_uses_last_assistant_text() {
        let gateway = Arc::new(MockGateway::new(vec![
            tool_response(
                "Let me calculate.",
                &[("c1", "calculator", "expression", "12*7")],
            ),
            tool_response("", &[("c2", "calculator", "expression", "12*7")]),
        ]));
        let tools = Arc::new(MockTools::new());
        let params = OrchestrationParams::default().with_max_rounds(2);
        let output = use_case(gateway.clone(), tools.clone())
            .execute(input("12*7?").with_params(params), &NoChatEvents)
            .await;

        assert_eq!(output.state, OrchestrationState::Done);
        assert!(output.limit_reached);
        assert_eq!(output.rounds, 2);
        assert_eq!(output.answer.as_deref(), Some("Let me calculate."));
        // Tools requested in the final round are not run
        assert_eq!(tools.run_count(), 1);
        assert_eq!(gateway.request_count(), 2);
    }

    #[tokio::test]
    async fn test_round_limit_without_text_aborts() {
        let gateway = Arc::new(MockGateway::new(vec![
            tool_response("", &[("c1", "calculator", "expression", "12*7")]),
            tool_response("", &[("c2", "calculator", "expression", "12*7")]),
            tool_response("", &[("c3", "calculator", "expression", "12*7")]),
        ]));
        let tools = Arc::new(MockTools::new());
        let output = use_case(gateway.clone(), tools)
            .execute(input("12*7?"), &NoChatEvents)
            .await;

        assert_eq!(output.state, OrchestrationState::Aborted);
        assert!(output.limit_reached);
        assert_eq!(output.rounds, 3);
        assert_eq!(gateway.request_count(), 3);
        assert_eq!(
            output.error,
            Some(OrchestrationError::LimitExceeded { rounds: 3 })
        );
    }

    fn follow_up(question: &str) -> ChatWithToolsInput {
        let mut conversation = Conversation::new();
        conversation.push(Message::user("Capital of France?"));
        conversation.push(Message::assistant("Paris."));
        conversation.push(Message::user(question));
        ChatWithToolsInput::new(conversation)
    }

    #[tokio::test]
    async fn test_round_limit_ignores_earlier_turns() {
        let gateway = Arc::new(MockGateway::new(vec![
            tool_response("", &[("c1", "calculator", "expression", "12*7")]),
            tool_response("", &[("c2", "calculator", "expression", "12*7")]),
            tool_response("", &[("c3", "calculator", "expression", "12*7")]),
        ]));
        let output = use_case(gateway, Arc::new(MockTools::new()))
            .execute(follow_up("What's 12*7?"), &NoChatEvents)
            .await;

        assert_eq!(output.state, OrchestrationState::Aborted);
        assert_eq!(output.answer, None);
        assert_eq!(
            output.error,
            Some(OrchestrationError::LimitExceeded { rounds: 3 })
        );
    }

    #[tokio::test]
    async fn test_empty_reply_does_not_repeat_earlier_answer() {
        let gateway = Arc::new(MockGateway::new(vec![text_response("")]));
        let output = use_case(gateway, Arc::new(MockTools::new()))
            .execute(follow_up("What's 12*7?"), &NoChatEvents)
            .await;

        assert_eq!(output.state, OrchestrationState::Done);
        assert_eq!(output.answer.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_per_round_tool_cap_truncates() {
        let gateway = Arc::new(MockGateway::new(vec![
            tool_response(
                "",
                &[
                    ("c1", "calculator", "expression", "12*7"),
                    ("c2", "weather", "location", "Paris"),
                    ("c3", "weather", "location", "Rome"),
                ],
            ),
            text_response("done"),
        ]));
        let tools = Arc::new(MockTools::new());
        let params = OrchestrationParams::default().with_max_tools_per_round(2);
        let output = use_case(gateway, tools.clone())
            .execute(input("lots").with_params(params), &NoChatEvents)
            .await;

        assert!(output.is_done());
        assert_eq!(output.usage_log.len(), 2);
        assert_eq!(tools.run_count(), 2);
        assert_eq!(output.conversation.messages()[1].tool_calls.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_call_ids_are_assigned() {
        let gateway = Arc::new(MockGateway::new(vec![
            tool_response("", &[("", "weather", "location", "Oslo")]),
            text_response("Cold."),
        ]));
        let tools = Arc::new(MockTools::new());
        let output = use_case(gateway, tools)
            .execute(input("Oslo?"), &NoChatEvents)
            .await;

        let tool_message = &output.conversation.messages()[2];
        assert_eq!(tool_message.tool_call_id.as_deref(), Some("call_1_1"));
        assert_eq!(
            output.conversation.messages()[1].tool_calls[0].id.as_deref(),
            Some("call_1_1")
        );
    }

    #[tokio::test]
    async fn test_event_sequence() {
        let gateway = Arc::new(MockGateway::new(vec![
            tool_response("Checking.", &[("c1", "calculator", "expression", "12*7")]),
            text_response("It is 84."),
        ]));
        let tools = Arc::new(MockTools::new());
        let (sink, mut rx) = ChannelChatEvents::new();
        use_case(gateway, tools).execute(input("12*7?"), &sink).await;

        let events = drain(&mut rx);
        assert_eq!(
            events[0],
            ChatEvent::UserReceived {
                content: "12*7?".to_string()
            }
        );
        assert_eq!(events[1], ChatEvent::AssistantStart { round: 1 });
        assert_eq!(
            events[2],
            ChatEvent::ContentChunk {
                content: "Checking.".to_string()
            }
        );
        assert!(matches!(&events[3], ChatEvent::ToolInvoked { tool, .. } if tool == "calculator"));
        assert!(matches!(&events[4], ChatEvent::ToolCompleted { success: true, .. }));
        assert_eq!(events[5], ChatEvent::AssistantStart { round: 2 });
        match events.last() {
            Some(ChatEvent::Complete {
                content,
                tool_usage,
            }) => {
                assert_eq!(content, "It is 84.");
                assert_eq!(tool_usage.len(), 1);
            }
            other => panic!("Expected Complete, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_extract_answer_for_reasoning_model() {
        let response = LlmResponse::from_text("First I multiply.\n\nAnswer: 84")
            .with_model("deepseek-reasoner");
        let gateway = Arc::new(MockGateway::new(vec![Ok(response)]));
        let tools = Arc::new(MockTools::new());
        let (sink, mut rx) = ChannelChatEvents::new();
        let params = OrchestrationParams::default().with_extract_answer_only(true);
        let output = use_case(gateway, tools)
            .execute(input("12*7?").with_params(params), &sink)
            .await;

        assert_eq!(output.answer.as_deref(), Some("84"));
        let events = drain(&mut rx);
        assert!(events.contains(&ChatEvent::ReplaceContent {
            content: "84".to_string()
        }));
        // Full text was shown before the replacement
        assert!(events.iter().any(
            |e| matches!(e, ChatEvent::ContentChunk { content } if content.contains("First I multiply"))
        ));
    }

    #[tokio::test]
    async fn test_cancelled_session_aborts() {
        let gateway = Arc::new(
            MockGateway::new(vec![text_response("never")]).with_delay(Duration::from_millis(200)),
        );
        let tools = Arc::new(MockTools::new());
        let token = CancellationToken::new();
        token.cancel();
        let output = use_case(gateway, tools)
            .execute(input("hi").with_cancellation(token), &NoChatEvents)
            .await;

        assert_eq!(output.state, OrchestrationState::Aborted);
        assert_eq!(output.error, Some(OrchestrationError::Cancelled));
    }

    #[tokio::test]
    async fn test_empty_conversation_is_rejected() {
        let gateway = Arc::new(MockGateway::new(vec![]));
        let tools = Arc::new(MockTools::new());
        let output = use_case(gateway.clone(), tools)
            .execute(ChatWithToolsInput::new(Conversation::new()), &NoChatEvents)
            .await;

        assert_eq!(output.state, OrchestrationState::Aborted);
        assert_eq!(
            output.error,
            Some(OrchestrationError::InvalidConversation(
                DomainError::EmptyConversation
            ))
        );
        assert_eq!(gateway.request_count(), 0);
    }
}
