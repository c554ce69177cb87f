pub mod ask;
pub mod ingest;
