//! Tools the agent can offer to the model, and the registry that dispatches them by name
pub mod github;
pub mod registry;
pub mod retrieval;

use std::sync::Arc;

use crate::errors::AgentResult;
use crate::index::DocumentIndex;
use github::GithubStats;
use registry::ToolRegistry;
use retrieval::ResumeLookup;

/// The standard registry for the portfolio assistant: résumé lookup and GitHub statistics
pub fn portfolio_registry(
    index: Arc<dyn DocumentIndex>,
    stats: GithubStats,
) -> AgentResult<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(ResumeLookup::new(index).declaration())?;
    registry.register(stats.declaration())?;
    Ok(registry)
}
