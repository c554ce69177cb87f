use crate::errors::{AgentError, AgentResult};
use crate::models::message::Message;
use crate::models::role::Role;

/// The message history of a single invocation.
///
/// A conversation only ever grows. Every append is checked so that the history stays in a
/// shape the model backend accepts:
/// - a system message can only open the conversation
/// - a tool message can only answer calls from the latest assistant turn, once each
/// - nothing else can be appended while calls from that turn are unanswered
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a conversation from a single user message
    pub fn from_user_text<S: Into<String>>(text: S) -> Self {
        Self {
            messages: vec![Message::user().with_text(text)],
        }
    }

    /// Build a conversation from existing messages, validating each one in order
    pub fn from_messages(messages: impl IntoIterator<Item = Message>) -> AgentResult<Self> {
        let mut conversation = Self::new();
        for message in messages {
            conversation.push(message)?;
        }
        Ok(conversation)
    }

    /// Prepend a system message holding `prompt`, unless the conversation already opens with one
    pub fn with_system_instruction(self, prompt: &str) -> Self {
        if self.starts_with_system() {
            return self;
        }
        let mut messages = Vec::with_capacity(self.messages.len() + 1);
        messages.push(Message::system().with_text(prompt));
        messages.extend(self.messages);
        Self { messages }
    }

    pub fn starts_with_system(&self) -> bool {
        self.messages
            .first()
            .is_some_and(|message| message.role == Role::System)
    }

    /// Append a message
    pub fn push(&mut self, message: Message) -> AgentResult<()> {
        match message.role {
            Role::System if !self.messages.is_empty() => {
                return Err(AgentError::Internal(
                    "a system message can only open the conversation".to_string(),
                ));
            }
            Role::Tool => {
                let pending = self.pending_tool_calls();
                for response in message.tool_responses() {
                    if !pending.contains(&response.id.as_str()) {
                        return Err(AgentError::Internal(format!(
                            "tool result '{}' does not answer a pending tool call",
                            response.id
                        )));
                    }
                }
            }
            _ => {
                let pending = self.pending_tool_calls();
                if !pending.is_empty() {
                    return Err(AgentError::Internal(format!(
                        "{} tool call(s) still awaiting results: {}",
                        pending.len(),
                        pending.join(", ")
                    )));
                }
            }
        }
        self.messages.push(message);
        Ok(())
    }

    /// Ids of tool calls from the latest assistant turn that have no result yet, in request order
    pub fn pending_tool_calls(&self) -> Vec<&str> {
        let Some(turn) = self
            .messages
            .iter()
            .rposition(|message| message.role == Role::Assistant)
        else {
            return Vec::new();
        };

        let answered: Vec<&str> = self.messages[turn + 1..]
            .iter()
            .filter(|message| message.role == Role::Tool)
            .flat_map(|message| message.tool_responses())
            .map(|response| response.id.as_str())
            .collect();

        self.messages[turn]
            .tool_requests()
            .map(|request| request.id.as_str())
            .filter(|id| !answered.contains(id))
            .collect()
    }

    /// True when every tool call has been answered and the model can be asked again
    pub fn is_settled(&self) -> bool {
        self.pending_tool_calls().is_empty()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}
