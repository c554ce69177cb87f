use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::Passage;
use crate::errors::{AgentError, AgentResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredChunk {
    pub id: String,
    pub text: String,
    pub embedding: Vec<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Character offset of the chunk within its source document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_index: Option<usize>,
}

impl StoredChunk {
    pub fn new<S: Into<String>>(text: S, embedding: Vec<f32>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.into(),
            embedding,
            source: None,
            start_index: None,
        }
    }
}

/// Embedded chunks persisted as a single JSON document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorStore {
    /// The embedding model the chunks were embedded with
    pub model: String,
    pub chunks: Vec<StoredChunk>,
}

impl VectorStore {
    pub fn new<S: Into<String>>(model: S) -> Self {
        Self {
            model: model.into(),
            chunks: Vec::new(),
        }
    }

    pub fn push(&mut self, chunk: StoredChunk) {
        self.chunks.push(chunk);
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read vector store {}", path.display()))?;
        let store = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse vector store {}", path.display()))?;
        Ok(store)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_json::to_string(self)?)
            .with_context(|| format!("Failed to write vector store {}", path.display()))?;
        Ok(())
    }

    /// The `k` chunks closest to `query` by cosine similarity. Equal scores keep store order.
    pub fn search(&self, query: &[f32], k: usize) -> AgentResult<Vec<Passage>> {
        let mut scored = Vec::with_capacity(self.chunks.len());
        for chunk in &self.chunks {
            if chunk.embedding.len() != query.len() {
                return Err(AgentError::IndexUnavailable(format!(
                    "query has {} dimensions but the store was built with {} ({})",
                    query.len(),
                    chunk.embedding.len(),
                    self.model
                )));
            }
            scored.push((cosine_similarity(query, &chunk.embedding), chunk));
        }

        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(score, chunk)| Passage {
                text: chunk.text.clone(),
                source: chunk.source.clone(),
                score,
            })
            .collect())
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
