//! Session domain entities

use crate::core::error::DomainError;
use crate::tool::entities::ToolInvocation;
use crate::tool::value_objects::ToolResult;
use serde::{Deserialize, Serialize};

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A message in a conversation (Entity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Tool name for `tool` messages, optional participant name otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Id of the call a `tool` message answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Calls requested by an `assistant` message
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolInvocation>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            name: None,
            tool_call_id: None,
            tool_calls: Vec::new(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Assistant turn that requested tools.
    pub fn assistant_with_tools(content: impl Into<String>, calls: Vec<ToolInvocation>) -> Self {
        Self {
            tool_calls: calls,
            ..Self::new(Role::Assistant, content)
        }
    }

    /// Tool-role message carrying one result back to the model.
    pub fn tool(result: &ToolResult, call_id: Option<String>) -> Self {
        Self {
            name: Some(result.tool_name.clone()),
            tool_call_id: call_id,
            ..Self::new(Role::Tool, result.to_message_content())
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Ordered, append-only sequence of messages.
///
/// Messages cannot be edited or removed once pushed; a conversation only
/// grows during one orchestration call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system_prompt(prompt: impl Into<String>) -> Self {
        let mut conversation = Self::new();
        conversation.push(Message::system(prompt));
        conversation
    }

    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last_user_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::User)
    }

    /// Text of the most recent assistant message with non-empty content.
    pub fn last_assistant_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .filter(|m| m.role == Role::Assistant)
            .map(|m| m.content.as_str())
            .find(|c| !c.trim().is_empty())
    }

    /// Check the conversation can be sent to the model.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.messages.is_empty() {
            return Err(DomainError::EmptyConversation);
        }
        if self.last_user_message().is_none() {
            return Err(DomainError::NoUserMessage);
        }
        if let Some(orphan) = self
            .messages
            .iter()
            .find(|m| m.role == Role::Tool && m.tool_call_id.is_none() && m.name.is_none())
        {
            return Err(DomainError::InvalidMessage(format!(
                "tool message without tool name or call id: {}",
                orphan.content
            )));
        }
        Ok(())
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::Tool).unwrap(), "\"tool\"");
        assert_eq!(Role::Assistant.to_string(), "assistant");
    }

    #[test]
    fn test_tool_message_from_result() {
        let result = ToolResult::success("calculator", json!(84));
        let msg = Message::tool(&result, Some("call_1".to_string()));
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.content, "84");
        assert_eq!(msg.name.as_deref(), Some("calculator"));
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn test_conversation_grows_in_order() {
        let mut conversation = Conversation::with_system_prompt("be brief");
        conversation.push(Message::user("hi"));
        conversation.push(Message::assistant("hello"));

        assert_eq!(conversation.len(), 3);
        assert_eq!(conversation.messages()[0].role, Role::System);
        assert_eq!(conversation.last_user_message().unwrap().content, "hi");
        assert_eq!(conversation.last_assistant_text(), Some("hello"));
    }

    #[test]
    fn test_last_assistant_text_skips_empty() {
        let mut conversation = Conversation::new();
        conversation.push(Message::user("q"));
        conversation.push(Message::assistant("thinking out loud"));
        conversation.push(Message::assistant_with_tools(
            "",
            vec![ToolInvocation::new("calculator")],
        ));
        assert_eq!(conversation.last_assistant_text(), Some("thinking out loud"));
    }

    #[test]
    fn test_validate() {
        assert_eq!(
            Conversation::new().validate(),
            Err(DomainError::EmptyConversation)
        );
        assert_eq!(
            Conversation::with_system_prompt("sys").validate(),
            Err(DomainError::NoUserMessage)
        );

        let mut ok = Conversation::new();
        ok.push(Message::user("hello"));
        assert!(ok.validate().is_ok());
    }
}
