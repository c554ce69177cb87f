use futures::future::join_all;
use std::sync::Arc;

use crate::conversation::Conversation;
use crate::errors::{AgentError, AgentResult};
use crate::gateway::ModelGateway;
use crate::models::message::{Message, ToolRequest};
use crate::providers::base::Provider;
use crate::tools::registry::ToolRegistry;

/// Model calls allowed per invocation unless configured otherwise
pub const DEFAULT_MAX_ROUNDS: usize = 8;

/// Where the control loop is within one invocation
#[derive(Debug)]
enum LoopState {
    /// The conversation is settled and the model is asked for its next turn
    AwaitingModel,
    /// The model asked for these tools, in this order
    ExecutingTools(Vec<ToolRequest>),
    /// The model answered without requesting tools
    Done(Message),
}

/// The outcome of one invocation
#[derive(Debug, Clone)]
pub struct Reply {
    /// Text of the final assistant message
    pub answer: String,
    /// Everything exchanged during the invocation, system instruction included
    pub conversation: Conversation,
    /// Number of model calls made
    pub rounds: usize,
}

/// Agent integrates a tool-calling LLM with the tools it can use to answer
pub struct Agent {
    gateway: ModelGateway,
    registry: Arc<ToolRegistry>,
    system_prompt: String,
    max_rounds: usize,
}

impl Agent {
    pub fn new(
        provider: Arc<dyn Provider>,
        registry: Arc<ToolRegistry>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            gateway: ModelGateway::new(provider, Arc::clone(&registry)),
            registry,
            system_prompt: system_prompt.into(),
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    /// Cap the number of model calls per invocation. At least one call is always allowed.
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds.max(1);
        self
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Answer a single user message from a fresh conversation
    pub async fn answer(&self, query: &str) -> AgentResult<String> {
        let reply = self.run(Conversation::from_user_text(query)).await?;
        Ok(reply.answer)
    }

    /// Drive the conversation until the model produces an answer without tool requests
    pub async fn run(&self, conversation: Conversation) -> AgentResult<Reply> {
        let mut conversation = conversation.with_system_instruction(&self.system_prompt);
        let mut rounds = 0;
        let mut state = LoopState::AwaitingModel;

        loop {
            state = match state {
                LoopState::AwaitingModel => {
                    if rounds >= self.max_rounds {
                        tracing::warn!(rounds, "model kept requesting tools, giving up");
                        return Err(AgentError::RoundLimitExceeded(self.max_rounds));
                    }
                    rounds += 1;

                    let response = self.gateway.complete(&conversation).await?;
                    let requests: Vec<ToolRequest> = response.tool_requests().cloned().collect();
                    conversation.push(response.clone())?;

                    if requests.is_empty() {
                        LoopState::Done(response)
                    } else {
                        LoopState::ExecutingTools(requests)
                    }
                }
                LoopState::ExecutingTools(requests) => {
                    // Calls within one turn are independent, run them together
                    let outputs =
                        join_all(requests.iter().map(|request| self.dispatch_tool_call(request)))
                            .await;

                    for (request, output) in requests.iter().zip(outputs) {
                        conversation
                            .push(Message::tool().with_tool_response(request.id.clone(), output))?;
                    }
                    LoopState::AwaitingModel
                }
                LoopState::Done(message) => {
                    tracing::info!(rounds, messages = conversation.len(), "reply complete");
                    return Ok(Reply {
                        answer: message.text(),
                        conversation,
                        rounds,
                    });
                }
            };
        }
    }

    /// Run one tool request. Failures are returned as values so they can be shown to the model.
    async fn dispatch_tool_call(&self, request: &ToolRequest) -> AgentResult<String> {
        let result = match &request.tool_call {
            Ok(call) => match self.registry.resolve(&call.name) {
                Ok(handler) => handler.execute(call.arguments.clone()).await,
                Err(e) => Err(e),
            },
            Err(e) => Err(e.clone()),
        };

        match &result {
            Ok(output) => tracing::debug!(id = %request.id, bytes = output.len(), "tool call finished"),
            Err(e) if e.is_recoverable() => {
                tracing::warn!(id = %request.id, "tool call failed: {}", e)
            }
            Err(e) => tracing::error!(id = %request.id, "tool call failed: {}", e),
        }
        result
    }
}
