use std::sync::Arc;

use crate::conversation::Conversation;
use crate::errors::{AgentError, AgentResult};
use crate::models::message::Message;
use crate::models::role::Role;
use crate::providers::base::Provider;
use crate::tools::registry::ToolRegistry;

/// A provider bound to the tool registry, so every completion advertises the registered tools
#[derive(Clone)]
pub struct ModelGateway {
    provider: Arc<dyn Provider>,
    registry: Arc<ToolRegistry>,
}

impl ModelGateway {
    pub fn new(provider: Arc<dyn Provider>, registry: Arc<ToolRegistry>) -> Self {
        Self { provider, registry }
    }

    /// Ask the backend for the next assistant turn.
    ///
    /// Any failure on the backend side is reported as [`AgentError::BackendUnavailable`].
    pub async fn complete(&self, conversation: &Conversation) -> AgentResult<Message> {
        let pending = conversation.pending_tool_calls();
        if !pending.is_empty() {
            return Err(AgentError::Internal(format!(
                "cannot ask the model while tool calls are unanswered: {}",
                pending.join(", ")
            )));
        }

        let tools = self.registry.describe_all();
        let (message, usage) = self
            .provider
            .complete(conversation.messages(), &tools)
            .await
            .map_err(|e| AgentError::BackendUnavailable(e.to_string()))?;

        if message.role != Role::Assistant {
            return Err(AgentError::BackendUnavailable(format!(
                "expected an assistant message, got {:?}",
                message.role
            )));
        }

        let message = message.with_unique_tool_request_ids();
        tracing::debug!(
            input_tokens = ?usage.input_tokens,
            output_tokens = ?usage.output_tokens,
            tool_requests = message.tool_requests().count(),
            "model completion"
        );
        Ok(message)
    }
}
