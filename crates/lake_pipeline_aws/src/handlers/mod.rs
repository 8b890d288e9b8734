pub mod curate;
pub mod ingest;
