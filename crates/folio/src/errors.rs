use serde::{Deserialize, Serialize};
use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum AgentError {
    #[error("Tool '{0}' is not available")]
    UnknownTool(String),

    #[error("Tool '{0}' is already registered")]
    DuplicateTool(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Tool execution failed: {0}")]
    ToolExecution(String),

    #[error("Document index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Language model backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Gave up after {0} model rounds without a final answer")]
    RoundLimitExceeded(usize),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AgentError {
    /// Whether the control loop can fold this error into a tool result and keep going
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AgentError::UnknownTool(_)
                | AgentError::InvalidParameters(_)
                | AgentError::ToolExecution(_)
                | AgentError::IndexUnavailable(_)
        )
    }
}

pub type AgentResult<T> = Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_errors() {
        assert!(AgentError::UnknownTool("x".into()).is_recoverable());
        assert!(AgentError::IndexUnavailable("down".into()).is_recoverable());
        assert!(!AgentError::BackendUnavailable("down".into()).is_recoverable());
        assert!(!AgentError::RoundLimitExceeded(3).is_recoverable());
    }

    #[test]
    fn test_unknown_tool_message() {
        let err = AgentError::UnknownTool("send_email".into());
        assert_eq!(err.to_string(), "Tool 'send_email' is not available");
    }
}
