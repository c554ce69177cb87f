use super::role::Role;
use super::tool::ToolCall;
use crate::errors::AgentResult;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRequest {
    pub id: String,
    pub tool_call: AgentResult<ToolCall>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub id: String,
    pub tool_result: AgentResult<String>,
}

impl ToolResponse {
    /// The text the model sees for this result. Errors are shown as output so the model can
    /// interpret them rather than the turn failing.
    pub fn text(&self) -> String {
        match &self.tool_result {
            Ok(text) => text.clone(),
            Err(e) => format!("The tool call returned the following error:\n{}", e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Content passed inside a message, which can be both simple text and tool content
pub enum MessageContent {
    Text(TextContent),
    ToolRequest(ToolRequest),
    ToolResponse(ToolResponse),
}

impl MessageContent {
    pub fn text<S: Into<String>>(text: S) -> Self {
        MessageContent::Text(TextContent { text: text.into() })
    }

    pub fn tool_request<S: Into<String>>(id: S, tool_call: AgentResult<ToolCall>) -> Self {
        MessageContent::ToolRequest(ToolRequest {
            id: id.into(),
            tool_call,
        })
    }

    pub fn tool_response<S: Into<String>>(id: S, tool_result: AgentResult<String>) -> Self {
        MessageContent::ToolResponse(ToolResponse {
            id: id.into(),
            tool_result,
        })
    }

    pub fn as_tool_request(&self) -> Option<&ToolRequest> {
        if let MessageContent::ToolRequest(ref tool_request) = self {
            Some(tool_request)
        } else {
            None
        }
    }

    pub fn as_tool_response(&self) -> Option<&ToolResponse> {
        if let MessageContent::ToolResponse(ref tool_response) = self {
            Some(tool_response)
        } else {
            None
        }
    }

    /// Get the text content if this is a TextContent variant
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(text) => Some(&text.text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A message to or from an LLM
pub struct Message {
    pub role: Role,
    pub created: i64,
    pub content: Vec<MessageContent>,
}

impl Message {
    fn new(role: Role) -> Self {
        Message {
            role,
            created: Utc::now().timestamp(),
            content: Vec::new(),
        }
    }

    /// Create a new system message with the current timestamp
    pub fn system() -> Self {
        Self::new(Role::System)
    }

    /// Create a new user message with the current timestamp
    pub fn user() -> Self {
        Self::new(Role::User)
    }

    /// Create a new assistant message with the current timestamp
    pub fn assistant() -> Self {
        Self::new(Role::Assistant)
    }

    /// Create a new tool result message with the current timestamp
    pub fn tool() -> Self {
        Self::new(Role::Tool)
    }

    /// Add any MessageContent to the message
    pub fn with_content(mut self, content: MessageContent) -> Self {
        self.content.push(content);
        self
    }

    /// Add text content to the message
    pub fn with_text<S: Into<String>>(self, text: S) -> Self {
        self.with_content(MessageContent::text(text))
    }

    /// Add a tool request to the message
    pub fn with_tool_request<S: Into<String>>(
        self,
        id: S,
        tool_call: AgentResult<ToolCall>,
    ) -> Self {
        self.with_content(MessageContent::tool_request(id, tool_call))
    }

    /// Add a tool response to the message
    pub fn with_tool_response<S: Into<String>>(self, id: S, result: AgentResult<String>) -> Self {
        self.with_content(MessageContent::tool_response(id, result))
    }

    /// All text content of the message, joined by newlines
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|c| c.as_text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn tool_requests(&self) -> impl Iterator<Item = &ToolRequest> {
        self.content.iter().filter_map(|c| c.as_tool_request())
    }

    pub fn tool_responses(&self) -> impl Iterator<Item = &ToolResponse> {
        self.content.iter().filter_map(|c| c.as_tool_response())
    }

    pub fn has_tool_requests(&self) -> bool {
        self.tool_requests().next().is_some()
    }

    /// Give every tool request a distinct id. Empty ids and ids already used earlier in this
    /// message are replaced with a generated `call_<uuid>`, so each request can be answered.
    pub fn with_unique_tool_request_ids(mut self) -> Self {
        let mut seen = HashSet::new();
        for content in self.content.iter_mut() {
            if let MessageContent::ToolRequest(request) = content {
                if request.id.is_empty() || !seen.insert(request.id.clone()) {
                    request.id = format!("call_{}", uuid::Uuid::new_v4().simple());
                    seen.insert(request.id.clone());
                }
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AgentError;
    use serde_json::json;

    #[test]
    fn test_text_joins_text_content_only() {
        let message = Message::assistant()
            .with_text("first")
            .with_tool_request("1", Ok(ToolCall::new("lookup_resume", json!({"query": "x"}))))
            .with_text("second");

        assert_eq!(message.text(), "first\nsecond");
        assert!(message.has_tool_requests());
        assert_eq!(message.tool_requests().count(), 1);
    }

    #[test]
    fn test_tool_response_text() {
        let ok = ToolResponse {
            id: "1".into(),
            tool_result: Ok("42 stars".into()),
        };
        assert_eq!(ok.text(), "42 stars");

        let err = ToolResponse {
            id: "2".into(),
            tool_result: Err(AgentError::UnknownTool("send_email".into())),
        };
        assert_eq!(
            err.text(),
            "The tool call returned the following error:\nTool 'send_email' is not available"
        );
    }

    #[test]
    fn test_repeated_request_ids_are_replaced() {
        let message = Message::assistant()
            .with_tool_request("call_0", Ok(ToolCall::new("lookup_resume", json!({"query": "a"}))))
            .with_tool_request("call_0", Ok(ToolCall::new("get_github_stats", json!({}))))
            .with_tool_request("", Ok(ToolCall::new("get_github_stats", json!({}))))
            .with_unique_tool_request_ids();

        let ids: Vec<&str> = message.tool_requests().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), 3);
        assert_eq!(ids[0], "call_0");
        assert!(ids[1].starts_with("call_") && ids[1] != "call_0");
        assert!(ids[2].starts_with("call_") && ids[2] != ids[1]);
    }

    #[test]
    fn test_role_serialization() {
        let message = Message::tool().with_tool_response("1", Ok("done".into()));
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["role"], "tool");
    }
}
