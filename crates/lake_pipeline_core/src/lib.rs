//! Shared lake pipeline primitives.
//!
//! This crate owns the curate job and ingest handler contracts, storage key
//! layout, the column rename, and the Arrow/Parquet codec. It intentionally
//! excludes AWS SDK and Lambda runtime concerns.

pub mod args;
pub mod catalog;
pub mod codec;
pub mod contract;
pub mod storage_keys;
pub mod transform;
