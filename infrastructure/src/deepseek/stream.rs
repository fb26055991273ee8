//! Server-sent-events decoding for streamed chat completions
//!
//! The API streams `data: {json}` lines terminated by `data: [DONE]`.
//! [`SseDecoder`] turns raw body bytes into [`StreamEvent`]s and assembles
//! the final [`LlmResponse`], including tool calls whose name and
//! arguments arrive in fragments keyed by `index`.

use deepseek_application::ports::llm_gateway::StreamHandle;
use deepseek_domain::{ContentBlock, LlmResponse, StopReason, StreamEvent, TokenUsage};
use futures::StreamExt;
use std::collections::BTreeMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::protocol::{StreamChunk, tool_use_block};

#[derive(Debug, Default)]
struct PartialToolCall {
    id: String,
    name: String,
    arguments: String,
}

/// Incremental SSE decoder.
#[derive(Debug, Default)]
pub struct SseDecoder {
    line_buffer: Vec<u8>,
    text: String,
    reasoning: String,
    tool_calls: BTreeMap<usize, PartialToolCall>,
    model: Option<String>,
    finish_reason: Option<String>,
    usage: Option<TokenUsage>,
    done: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw body bytes, returning the deltas they complete.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        for &byte in bytes {
            if byte == b'\n' {
                let line = std::mem::take(&mut self.line_buffer);
                self.process_line(&String::from_utf8_lossy(&line), &mut events);
            } else {
                self.line_buffer.push(byte);
            }
        }
        events
    }

    /// Whether `[DONE]` was seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    fn process_line(&mut self, line: &str, events: &mut Vec<StreamEvent>) {
        let line = line.trim_end_matches('\r');
        let Some(data) = line.strip_prefix("data:") else {
            return;
        };
        let data = data.trim_start();
        if data == "[DONE]" {
            self.done = true;
            return;
        }

        let chunk = match serde_json::from_str::<StreamChunk>(data) {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!(error = %e, "Skipping undecodable stream chunk");
                return;
            }
        };

        if chunk.model.is_some() {
            self.model = chunk.model;
        }
        if let Some(usage) = chunk.usage {
            self.usage = Some(usage.into());
        }

        for choice in chunk.choices {
            let delta = choice.delta;
            if let Some(reasoning) = delta.reasoning_content.filter(|r| !r.is_empty()) {
                self.reasoning.push_str(&reasoning);
                events.push(StreamEvent::ReasoningDelta(reasoning));
            }
            if let Some(content) = delta.content.filter(|c| !c.is_empty()) {
                self.text.push_str(&content);
                events.push(StreamEvent::Delta(content));
            }
            for fragment in delta.tool_calls {
                let entry = self.tool_calls.entry(fragment.index).or_default();
                if let Some(id) = fragment.id {
                    entry.id = id;
                }
                if let Some(function) = fragment.function {
                    if let Some(name) = function.name {
                        entry.name.push_str(&name);
                    }
                    if let Some(arguments) = function.arguments {
                        entry.arguments.push_str(&arguments);
                    }
                }
            }
            if choice.finish_reason.is_some() {
                self.finish_reason = choice.finish_reason;
            }
        }
    }

    /// Assemble everything received so far into a response.
    pub fn finish(mut self) -> LlmResponse {
        // A final line without a trailing newline
        if !self.line_buffer.is_empty() {
            let line = std::mem::take(&mut self.line_buffer);
            let mut ignored = Vec::new();
            self.process_line(&String::from_utf8_lossy(&line), &mut ignored);
        }

        let mut content = Vec::new();
        if !self.text.is_empty() {
            content.push(ContentBlock::Text(self.text));
        }
        for (_, call) in self.tool_calls {
            if call.name.is_empty() {
                warn!(id = %call.id, "Dropping streamed tool call without a name");
                continue;
            }
            content.push(tool_use_block(call.id, call.name, &call.arguments));
        }

        LlmResponse {
            content,
            reasoning: (!self.reasoning.is_empty()).then_some(self.reasoning),
            stop_reason: self
                .finish_reason
                .as_deref()
                .map(StopReason::from_finish_reason),
            model: self.model,
            usage: self.usage,
        }
    }
}

/// Decode `response` on a background task, forwarding events to the handle.
pub fn spawn_stream(response: reqwest::Response) -> StreamHandle {
    let (tx, rx) = mpsc::channel(64);

    tokio::spawn(async move {
        let mut decoder = SseDecoder::new();
        let mut body = response.bytes_stream();

        while let Some(chunk) = body.next().await {
            match chunk {
                Ok(bytes) => {
                    for event in decoder.push(&bytes) {
                        if tx.send(event).await.is_err() {
                            debug!("Stream receiver dropped; stopping");
                            return;
                        }
                    }
                    if decoder.is_done() {
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx.send(StreamEvent::Error(e.to_string())).await;
                    return;
                }
            }
        }

        let _ = tx.send(StreamEvent::Completed(decoder.finish())).await;
    });

    StreamHandle::new(rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(json: &str) -> String {
        format!("data: {json}\n\n")
    }

    #[test]
    fn test_text_deltas() {
        let mut decoder = SseDecoder::new();
        let mut events = decoder.push(
            data(r#"{"model":"deepseek-chat","choices":[{"delta":{"content":"Hel"}}]}"#).as_bytes(),
        );
        events.extend(decoder.push(data(r#"{"choices":[{"delta":{"content":"lo"},"finish_reason":"stop"}]}"#).as_bytes()));
        events.extend(decoder.push(b"data: [DONE]\n\n"));

        assert_eq!(
            events,
            vec![
                StreamEvent::Delta("Hel".into()),
                StreamEvent::Delta("lo".into())
            ]
        );
        assert!(decoder.is_done());

        let response = decoder.finish();
        assert_eq!(response.text_content(), "Hello");
        assert_eq!(response.model.as_deref(), Some("deepseek-chat"));
        assert_eq!(response.stop_reason, Some(StopReason::EndTurn));
    }

    #[test]
    fn test_lines_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        let line = data(r#"{"choices":[{"delta":{"content":"héllo"}}]}"#);
        let bytes = line.as_bytes();
        // Split inside the multi-byte character
        let split = line.find('é').unwrap() + 1;

        assert!(decoder.push(&bytes[..split]).is_empty());
        let events = decoder.push(&bytes[split..]);
        assert_eq!(events, vec![StreamEvent::Delta("héllo".into())]);
    }

    #[test]
    fn test_reasoning_deltas() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(
            data(r#"{"choices":[{"delta":{"reasoning_content":"think","content":null}}]}"#)
                .as_bytes(),
        );
        assert_eq!(events, vec![StreamEvent::ReasoningDelta("think".into())]);
        decoder.push(data(r#"{"choices":[{"delta":{"content":"42"}}]}"#).as_bytes());

        let response = decoder.finish();
        assert_eq!(response.reasoning.as_deref(), Some("think"));
        assert_eq!(response.text_content(), "42");
    }

    #[test]
    fn test_tool_call_fragments_by_index() {
        let mut decoder = SseDecoder::new();
        let chunks = [
            r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"id":"call_1","function":{"name":"calculator","arguments":""}}]}}]}"#,
            r#"{"choices":[{"delta":{"tool_calls":[{"index":1,"id":"call_2","function":{"name":"weather","arguments":"{\"loc"}}]}}]}"#,
            r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"function":{"arguments":"{\"expression\":"}}]}}]}"#,
            r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"function":{"arguments":"\"12*7\"}"}}]}}]}"#,
            r#"{"choices":[{"delta":{"tool_calls":[{"index":1,"function":{"arguments":"ation\":\"Paris\"}"}}]},"finish_reason":"tool_calls"}],"usage":{"prompt_tokens":3,"completion_tokens":4,"total_tokens":7}}"#,
        ];
        for chunk in chunks {
            assert!(decoder.push(data(chunk).as_bytes()).is_empty());
        }

        let response = decoder.finish();
        assert_eq!(response.stop_reason, Some(StopReason::ToolUse));
        assert_eq!(response.usage.map(|u| u.total_tokens), Some(7));

        let calls = response.tool_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].id.as_deref(), Some("call_1"));
        assert_eq!(calls[0].get_str("expression"), Some("12*7"));
        assert_eq!(calls[1].tool_name, "weather");
        assert_eq!(calls[1].get_str("location"), Some("Paris"));
    }

    #[test]
    fn test_ignores_comments_and_garbage() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b": keep-alive\n\ndata: {not json}\n\nevent: ping\n");
        assert!(events.is_empty());
        assert!(decoder.finish().content.is_empty());
    }

    #[test]
    fn test_trailing_line_without_newline() {
        let mut decoder = SseDecoder::new();
        decoder.push(br#"data: {"choices":[{"delta":{"content":"tail"}}]}"#);
        assert_eq!(decoder.finish().text_content(), "tail");
    }
}
