//! Semantic search over the ingested résumé.
//!
//! The agent only sees the [`DocumentIndex`] trait. [`LocalIndex`] is the concrete index used by
//! the binaries: a JSON vector store on disk, queried with embeddings from an
//! OpenAI-compatible endpoint.
pub mod embeddings;
pub mod splitter;
pub mod store;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::{AgentError, AgentResult};
use embeddings::Embedder;
use store::VectorStore;

/// A passage of source text returned by a search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub text: String,
    pub source: Option<String>,
    pub score: f32,
}

impl Passage {
    pub fn new<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            source: None,
            score: 0.0,
        }
    }
}

#[async_trait]
pub trait DocumentIndex: Send + Sync {
    /// The `k` passages most similar to `query`, most similar first
    async fn search(&self, query: &str, k: usize) -> AgentResult<Vec<Passage>>;
}

/// A [`VectorStore`] loaded from disk, paired with the embedder used to build it
pub struct LocalIndex {
    path: PathBuf,
    store: Option<VectorStore>,
    embedder: Arc<dyn Embedder>,
}

impl LocalIndex {
    /// Open the store at `path`. A missing or unreadable store does not fail here: the index is
    /// reported as unavailable when searched, so the assistant can still answer other questions.
    pub fn open(path: impl AsRef<Path>, embedder: Arc<dyn Embedder>) -> Self {
        let path = path.as_ref().to_path_buf();
        let store = match VectorStore::load(&path) {
            Ok(store) => {
                tracing::info!(
                    path = %path.display(),
                    chunks = store.len(),
                    "loaded document index"
                );
                Some(store)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "document index not loaded: {}", e);
                None
            }
        };
        Self {
            path,
            store,
            embedder,
        }
    }

    pub fn from_store(store: VectorStore, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            path: PathBuf::new(),
            store: Some(store),
            embedder,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.store.is_some()
    }
}

#[async_trait]
impl DocumentIndex for LocalIndex {
    async fn search(&self, query: &str, k: usize) -> AgentResult<Vec<Passage>> {
        let store = self.store.as_ref().ok_or_else(|| {
            AgentError::IndexUnavailable(format!(
                "no document index at {}, run `folio ingest` first",
                self.path.display()
            ))
        })?;

        let query_embedding = self
            .embedder
            .embed_one(query)
            .await
            .map_err(|e| AgentError::IndexUnavailable(format!("embedding query failed: {}", e)))?;

        store.search(&query_embedding, k)
    }
}
