use std::process::ExitCode;

use chrono::Utc;
use lake_pipeline_aws::adapters::glue::GlueTableCatalog;
use lake_pipeline_aws::adapters::s3::S3ObjectStore;
use lake_pipeline_aws::handlers::curate::{run_curate_job, CurateJobConfig, JobError};
use lake_pipeline_aws::logging;
use lake_pipeline_core::args::JobArguments;
use lake_pipeline_core::contract::JobCommitRecord;
use tracing::error;

async fn run() -> Result<JobCommitRecord, JobError> {
    let arguments = JobArguments::from_argv(std::env::args().skip(1))?;

    let now = Utc::now();
    let config = CurateJobConfig::init(
        arguments,
        format!("local_{}", now.format("%Y%m%dT%H%M%S")),
        now.to_rfc3339(),
    );

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let catalog = GlueTableCatalog::new(aws_sdk_glue::Client::new(&aws_config));
    let store = S3ObjectStore::new(aws_sdk_s3::Client::new(&aws_config));

    run_curate_job(&config, &catalog, &store)
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init("info");

    match run().await {
        Ok(_) => ExitCode::SUCCESS,
        Err(job_error) => {
            error!(
                component = "curate_job",
                event = "job_failed",
                error = %job_error,
            );
            ExitCode::FAILURE
        }
    }
}
