use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::Path;

use crate::index::embeddings::Embedder;
use crate::index::splitter::TextSplitter;
use crate::index::store::{StoredChunk, VectorStore};

const EMBED_BATCH_SIZE: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    pub chunks: usize,
    pub characters: usize,
    pub replaced_existing: bool,
}

/// Split `text` into chunks and embed them into a fresh store
pub async fn build_store(
    text: &str,
    source: &str,
    splitter: &TextSplitter,
    embedder: &dyn Embedder,
    model: &str,
) -> Result<VectorStore> {
    let chunks = splitter.split(text);
    tracing::info!(source, chunks = chunks.len(), "split document");

    let mut store = VectorStore::new(model);
    for batch in chunks.chunks(EMBED_BATCH_SIZE) {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
        let embeddings = embedder.embed(&texts).await?;
        if embeddings.len() != batch.len() {
            return Err(anyhow!(
                "Expected {} embeddings, got {}",
                batch.len(),
                embeddings.len()
            ));
        }
        for (chunk, embedding) in batch.iter().zip(embeddings) {
            let mut stored = StoredChunk::new(chunk.text.clone(), embedding);
            stored.source = Some(source.to_string());
            stored.start_index = chunk.start_index;
            store.push(stored);
        }
    }
    Ok(store)
}

/// The text of a résumé file. PDFs are extracted page by page; anything else is read as UTF-8.
pub fn read_document(path: &Path) -> Result<String> {
    let is_pdf = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

    if is_pdf {
        pdf_extract::extract_text(path)
            .map_err(|e| anyhow!("Failed to extract text from {}: {}", path.display(), e))
    } else {
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
    }
}

/// Read a PDF or text document, embed it, and replace whatever store exists at `store_path`
pub async fn ingest_file(
    source_path: &Path,
    store_path: &Path,
    splitter: &TextSplitter,
    embedder: &dyn Embedder,
    model: &str,
) -> Result<IngestReport> {
    let text = read_document(source_path)?;
    if text.trim().is_empty() {
        return Err(anyhow!("{} contains no text", source_path.display()));
    }

    let source = source_path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| source_path.display().to_string());
    let store = build_store(&text, &source, splitter, embedder, model).await?;

    let replaced_existing = store_path.exists();
    if replaced_existing {
        tracing::info!(path = %store_path.display(), "clearing existing vector store");
        fs::remove_file(store_path)?;
    }
    store.save(store_path)?;

    Ok(IngestReport {
        chunks: store.len(),
        characters: text.chars().count(),
        replaced_existing,
    })
}
