use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::{AgentError, AgentResult};
use crate::models::tool::Tool;

/// Executes one kind of tool call
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Run the tool with the arguments the model supplied, returning the text it should see
    async fn execute(&self, arguments: Value) -> AgentResult<String>;
}

/// A tool as advertised to the model, paired with the handler that runs it
#[derive(Clone)]
pub struct ToolDeclaration {
    pub tool: Tool,
    handler: Arc<dyn ToolHandler>,
}

impl ToolDeclaration {
    pub fn new<H: ToolHandler + 'static>(tool: Tool, handler: H) -> Self {
        Self {
            tool,
            handler: Arc::new(handler),
        }
    }

    pub fn name(&self) -> &str {
        &self.tool.name
    }
}

/// Tool declarations keyed by name. Filled once at startup and only read afterwards.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    declarations: Vec<ToolDeclaration>,
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, declaration: ToolDeclaration) -> AgentResult<()> {
        let name = declaration.name().to_string();
        if self.by_name.contains_key(&name) {
            return Err(AgentError::DuplicateTool(name));
        }
        self.by_name.insert(name, self.declarations.len());
        self.declarations.push(declaration);
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> AgentResult<Arc<dyn ToolHandler>> {
        self.by_name
            .get(name)
            .map(|&idx| Arc::clone(&self.declarations[idx].handler))
            .ok_or_else(|| AgentError::UnknownTool(name.to_string()))
    }

    /// Every registered tool, in registration order
    pub fn describe_all(&self) -> Vec<Tool> {
        self.declarations.iter().map(|d| d.tool.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}
