use std::sync::Arc;

use lake_pipeline_aws::adapters::s3::S3ObjectStore;
use lake_pipeline_aws::handlers::ingest::{handle_kinesis_event, IngestConfig};
use lake_pipeline_aws::logging;
use lake_pipeline_core::contract::IngestResponse;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing::info;

/// Handles acquired once per process and shared by every invocation.
struct RuntimeDependencies {
    config: IngestConfig,
    store: S3ObjectStore,
}

async fn handle_request(
    event: LambdaEvent<Value>,
    deps: &RuntimeDependencies,
) -> Result<IngestResponse, Error> {
    Ok(handle_kinesis_event(&event.payload, &deps.config, &deps.store))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    logging::init("info");

    let config = IngestConfig::from_env().map_err(|error| Error::from(error.to_string()))?;
    info!(
        component = "ingest_handler",
        event = "cold_start",
        landing_bucket = %config.landing_bucket,
        key_mode = config.key_mode.as_str(),
        payload_encoding = config.payload_encoding.as_str(),
    );

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let deps = Arc::new(RuntimeDependencies {
        config,
        store: S3ObjectStore::new(aws_sdk_s3::Client::new(&aws_config)),
    });

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let deps = Arc::clone(&deps);
        async move { handle_request(event, &deps).await }
    }))
    .await
}
