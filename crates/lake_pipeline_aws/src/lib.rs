//! AWS-oriented adapters and handlers for the lake pipeline.
//!
//! This crate owns runtime integration details (the Kinesis ingest Lambda,
//! the curate job entry point, S3 and Glue Data Catalog adapters) on top of
//! the contracts and transforms in `lake_pipeline_core`.

pub mod adapters;
pub mod handlers;
pub mod logging;
