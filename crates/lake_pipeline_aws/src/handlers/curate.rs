use std::time::Instant;

use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use lake_pipeline_core::args::{ArgumentError, JobArguments};
use lake_pipeline_core::catalog::{CatalogError, CatalogTable};
use lake_pipeline_core::codec::{decode_table_object, encode_parquet, CodecError};
use lake_pipeline_core::contract::{JobCommitRecord, RenamedColumn, COMMIT_RECORD_SCHEMA_VERSION};
use lake_pipeline_core::storage_keys::{
    commit_marker_object_key, curated_part_object_key, is_hidden_object_key,
    CURATED_OUTPUT_PREFIX,
};
use lake_pipeline_core::transform::{
    append_partition_columns, partition_values, rename_column, rename_schema_field,
    schema_with_partition_columns,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::adapters::catalog::TableCatalog;
use crate::adapters::object_store::{ObjectStore, StoreError};

#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Arguments(#[from] ArgumentError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to decode s3://{bucket}/{key}: {source}")]
    Decode {
        bucket: String,
        key: String,
        source: CodecError,
    },
    #[error("failed to transform s3://{bucket}/{key}: {source}")]
    Transform {
        bucket: String,
        key: String,
        source: ArrowError,
    },
    #[error("failed to encode parquet for {key}: {source}")]
    Encode { key: String, source: CodecError },
    #[error("failed to serialize commit record: {0}")]
    Commit(#[from] serde_json::Error),
}

/// Resolved inputs of one job run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurateJobConfig {
    pub arguments: JobArguments,
    pub job_run_id: String,
    pub event_time: String,
}

impl CurateJobConfig {
    /// Starts a job run; the scheduler-provided `JOB_RUN_ID` wins over
    /// `fallback_run_id`.
    pub fn init(arguments: JobArguments, fallback_run_id: String, event_time: String) -> Self {
        let job_run_id = arguments.job_run_id.clone().unwrap_or(fallback_run_id);
        Self {
            arguments,
            job_run_id,
            event_time,
        }
    }
}

/// Reads the catalog table, renames one column, writes Parquet parts under
/// `processed-data/` in the curated bucket, and commits the run.
///
/// The previous run's commit marker is removed before any part is written,
/// and any failure aborts the run before a new marker is written.
pub fn run_curate_job(
    config: &CurateJobConfig,
    catalog: &impl TableCatalog,
    store: &impl ObjectStore,
) -> Result<JobCommitRecord, JobError> {
    let started_at = Instant::now();
    let arguments = &config.arguments;
    info!(
        component = "curate_job",
        event = "job_started",
        job_name = %arguments.job_name,
        job_run_id = %config.job_run_id,
        source_database = %arguments.source_database,
        source_table = %arguments.source_table,
        curated_bucket = %arguments.curated_bucket,
    );

    let table = catalog.get_table(&arguments.source_database, &arguments.source_table)?;
    if table.location.bucket != arguments.landing_bucket {
        warn!(
            component = "curate_job",
            event = "source_outside_landing_bucket",
            table = %table.qualified_name(),
            location = %table.location,
            landing_bucket = %arguments.landing_bucket,
        );
    }

    let source_keys: Vec<String> = store
        .list_objects(&table.location.bucket, &table.location.prefix)?
        .into_iter()
        .filter(|key| !is_hidden_object_key(key))
        .collect();
    if source_keys.is_empty() {
        warn!(
            component = "curate_job",
            event = "source_empty",
            location = %table.location,
        );
    }

    // parts of an uncommitted run never sit next to a marker
    let marker_key = commit_marker_object_key();
    store.delete_object(&arguments.curated_bucket, &marker_key)?;
    info!(
        component = "curate_job",
        event = "commit_marker_cleared",
        bucket = %arguments.curated_bucket,
        key = %marker_key,
    );

    let mut files_written = Vec::with_capacity(source_keys.len());
    let mut rows_written = 0u64;
    let mut rename_target_seen = false;

    for (part_index, source_key) in source_keys.iter().enumerate() {
        let output_key = curated_part_object_key(part_index, &config.job_run_id);
        let (body, rows, had_column) =
            curate_object(&table, source_key, &output_key, arguments, store)?;
        rename_target_seen |= had_column;

        store.put_object(&arguments.curated_bucket, &output_key, &body)?;
        info!(
            component = "curate_job",
            event = "part_written",
            source_key = %source_key,
            output_key = %output_key,
            rows,
        );

        rows_written += rows as u64;
        files_written.push(output_key);
    }

    if !source_keys.is_empty() && !rename_target_seen {
        warn!(
            component = "curate_job",
            event = "rename_column_missing",
            column = %arguments.old_column_name,
            table = %table.qualified_name(),
        );
    }

    let record = JobCommitRecord {
        job_name: arguments.job_name.clone(),
        job_run_id: config.job_run_id.clone(),
        source_table: table.qualified_name(),
        source_location: table.location.to_string(),
        output_location: format!("s3://{}/{CURATED_OUTPUT_PREFIX}", arguments.curated_bucket),
        renamed_column: RenamedColumn {
            from: arguments.old_column_name.clone(),
            to: arguments.new_column_name.clone(),
        },
        files_written,
        rows_written,
        committed_at: config.event_time.clone(),
        record_schema: COMMIT_RECORD_SCHEMA_VERSION.to_string(),
    };
    commit_job(&record, &arguments.curated_bucket, store)?;

    info!(
        component = "curate_job",
        event = "job_committed",
        job_run_id = %record.job_run_id,
        files_written = record.files_written.len(),
        rows_written = record.rows_written,
        duration_ms = started_at.elapsed().as_millis() as u64,
    );
    Ok(record)
}

/// Reads one source object and returns its curated Parquet body, row count,
/// and whether it carried the column being renamed.
fn curate_object(
    table: &CatalogTable,
    source_key: &str,
    output_key: &str,
    arguments: &JobArguments,
    store: &impl ObjectStore,
) -> Result<(Vec<u8>, usize, bool), JobError> {
    let bucket = &table.location.bucket;
    let body = store.get_object(bucket, source_key)?;
    let decoded = decode_table_object(table, body).map_err(|source| JobError::Decode {
        bucket: bucket.clone(),
        key: source_key.to_string(),
        source,
    })?;

    let partitions = partition_values(source_key, &table.location.prefix, &table.partition_keys)?;
    let source_schema = schema_with_partition_columns(&decoded.schema, &partitions);
    let had_column = source_schema
        .column_with_name(&arguments.old_column_name)
        .is_some();
    let schema = rename_schema_field(
        &source_schema,
        &arguments.old_column_name,
        &arguments.new_column_name,
    );

    let batches = decoded
        .batches
        .iter()
        .map(|batch| {
            let batch = append_partition_columns(batch, &partitions)?;
            rename_column(
                &batch,
                &arguments.old_column_name,
                &arguments.new_column_name,
            )
        })
        .collect::<Result<Vec<RecordBatch>, ArrowError>>()
        .map_err(|source| JobError::Transform {
            bucket: bucket.clone(),
            key: source_key.to_string(),
            source,
        })?;

    let encoded = encode_parquet(schema, &batches).map_err(|source| JobError::Encode {
        key: output_key.to_string(),
        source,
    })?;
    Ok((encoded, decoded.num_rows(), had_column))
}

/// Marks the run complete by writing the commit record last.
fn commit_job(
    record: &JobCommitRecord,
    curated_bucket: &str,
    store: &impl ObjectStore,
) -> Result<(), JobError> {
    let body = serde_json::to_vec_pretty(record)?;
    store.put_object(curated_bucket, &commit_marker_object_key(), &body)?;
    Ok(())
}
