use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use super::registry::{ToolDeclaration, ToolHandler};
use crate::errors::{AgentError, AgentResult};
use crate::index::DocumentIndex;
use crate::models::tool::Tool;

pub const LOOKUP_RESUME: &str = "lookup_resume";

/// Passages requested from the index per lookup
const TOP_K: usize = 5;

/// Answers questions from the ingested résumé by returning the closest passages verbatim
#[derive(Clone)]
pub struct ResumeLookup {
    index: Arc<dyn DocumentIndex>,
}

impl ResumeLookup {
    pub fn new(index: Arc<dyn DocumentIndex>) -> Self {
        Self { index }
    }

    pub fn tool() -> Tool {
        Tool::new(
            LOOKUP_RESUME,
            "Consult the user's resume and portfolio data to answer questions about skills, projects, and experience.",
            json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What to look up, e.g. 'machine learning projects' or 'education'"
                    }
                },
                "required": ["query"]
            }),
        )
    }

    pub fn declaration(self) -> ToolDeclaration {
        ToolDeclaration::new(Self::tool(), self)
    }
}

#[async_trait]
impl ToolHandler for ResumeLookup {
    async fn execute(&self, arguments: Value) -> AgentResult<String> {
        let query = arguments
            .get("query")
            .and_then(|v| v.as_str())
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| {
                AgentError::InvalidParameters("query must be a non-empty string".into())
            })?;

        let passages = self.index.search(query, TOP_K).await?;
        tracing::debug!(query, passages = passages.len(), "resume lookup");

        Ok(passages
            .into_iter()
            .map(|p| p.text)
            .collect::<Vec<_>>()
            .join("\n\n"))
    }
}
