mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use folio::configuration::Settings;
use folio::index::splitter::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use commands::ask::handle_ask;
use commands::ingest::handle_ingest;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file to read instead of ./folio.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Split a résumé into chunks and build the vector store
    Ingest {
        /// Résumé to index: a PDF, or a text or markdown file
        #[arg(short, long)]
        source: PathBuf,

        /// Where to write the vector store (defaults to the configured store path)
        #[arg(long)]
        store: Option<PathBuf>,

        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,

        #[arg(long, default_value_t = DEFAULT_CHUNK_OVERLAP)]
        chunk_overlap: usize,
    },

    /// Ask the assistant a question, or start an interactive session without one
    Ask {
        question: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Command::Ingest {
            source,
            store,
            chunk_size,
            chunk_overlap,
        } => handle_ingest(&settings, &source, store, chunk_size, chunk_overlap).await,
        Command::Ask { question } => handle_ask(&settings, question).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ingest() {
        let cli = Cli::try_parse_from(["folio", "ingest", "--source", "resume.pdf"]).unwrap();
        match cli.command {
            Command::Ingest {
                source,
                store,
                chunk_size,
                chunk_overlap,
            } => {
                assert_eq!(source, PathBuf::from("resume.pdf"));
                assert!(store.is_none());
                assert_eq!(chunk_size, 1000);
                assert_eq!(chunk_overlap, 200);
            }
            _ => panic!("Expected ingest command"),
        }
    }

    #[test]
    fn test_parse_ask_with_config() {
        let cli = Cli::try_parse_from([
            "folio",
            "ask",
            "What are his skills?",
            "--config",
            "custom.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        match cli.command {
            Command::Ask { question } => {
                assert_eq!(question.as_deref(), Some("What are his skills?"))
            }
            _ => panic!("Expected ask command"),
        }
    }

    #[test]
    fn test_ingest_requires_source() {
        assert!(Cli::try_parse_from(["folio", "ingest"]).is_err());
    }
}
