use anyhow::Result;
use console::style;
use folio::bootstrap::build_embedder;
use folio::configuration::Settings;
use folio::index::splitter::TextSplitter;
use folio::ingest::ingest_file;
use std::path::{Path, PathBuf};

/// Embed `source` into the vector store, replacing whatever was indexed before
pub async fn handle_ingest(
    settings: &Settings,
    source: &Path,
    store: Option<PathBuf>,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Result<()> {
    cliclack::intro(style(" folio ingest ").on_cyan().black())?;

    let store_path = store.unwrap_or_else(|| settings.index.store_path.clone());
    let embedder = build_embedder(settings)?;
    let splitter = TextSplitter::new(chunk_size, chunk_overlap);

    let spin = cliclack::spinner();
    spin.start(format!(
        "Embedding {} with {}",
        source.display(),
        embedder.model()
    ));

    match ingest_file(source, &store_path, &splitter, embedder.as_ref(), embedder.model()).await
    {
        Ok(report) => {
            spin.stop(format!(
                "Indexed {} chunks ({} characters)",
                report.chunks, report.characters
            ));
            if report.replaced_existing {
                cliclack::log::info("Replaced the previous index")?;
            }
            cliclack::outro(format!(
                "Vector store written to {}",
                style(store_path.display()).green()
            ))?;
            Ok(())
        }
        Err(e) => {
            spin.error("Ingestion failed");
            cliclack::outro_cancel(e.to_string())?;
            Err(e)
        }
    }
}
