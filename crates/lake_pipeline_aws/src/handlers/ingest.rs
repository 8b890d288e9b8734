use lake_pipeline_core::contract::{decode_kinesis_records, IngestResponse, PayloadEncoding};
use lake_pipeline_core::storage_keys::{
    landing_object_key, LandingKeyMode, DEFAULT_LANDING_FIXED_KEY, DEFAULT_LANDING_PREFIX,
};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::adapters::object_store::ObjectStore;

pub const ENV_LANDING_BUCKET: &str = "LANDING_BUCKET";
pub const ENV_LANDING_KEY_MODE: &str = "LANDING_KEY_MODE";
pub const ENV_LANDING_FIXED_KEY: &str = "LANDING_FIXED_KEY";
pub const ENV_LANDING_PREFIX: &str = "LANDING_PREFIX";
pub const ENV_LANDING_PAYLOAD_ENCODING: &str = "LANDING_PAYLOAD_ENCODING";
pub const DEFAULT_LANDING_BUCKET: &str = "your-landing-bucket";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{variable} is invalid: {message}")]
    Invalid { variable: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestConfig {
    pub landing_bucket: String,
    pub key_mode: LandingKeyMode,
    pub payload_encoding: PayloadEncoding,
}

impl IngestConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str, default: &str| -> String {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let fixed_key = read(ENV_LANDING_FIXED_KEY, DEFAULT_LANDING_FIXED_KEY);
        let prefix = read(ENV_LANDING_PREFIX, DEFAULT_LANDING_PREFIX);
        let key_mode = LandingKeyMode::parse(
            &read(ENV_LANDING_KEY_MODE, "per-record"),
            &fixed_key,
            &prefix,
        )
        .map_err(|message| ConfigError::Invalid {
            variable: ENV_LANDING_KEY_MODE,
            message,
        })?;
        let payload_encoding = PayloadEncoding::parse(&read(ENV_LANDING_PAYLOAD_ENCODING, "raw"))
            .map_err(|message| ConfigError::Invalid {
                variable: ENV_LANDING_PAYLOAD_ENCODING,
                message,
            })?;

        Ok(Self {
            landing_bucket: read(ENV_LANDING_BUCKET, DEFAULT_LANDING_BUCKET),
            key_mode,
            payload_encoding,
        })
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestSummary {
    pub records_received: usize,
    pub records_written: usize,
    pub records_failed: usize,
}

/// Handles one Lambda invocation from a Kinesis event source mapping.
///
/// The response is always the fixed success body: decode and write failures
/// are logged per record and never fail the invocation.
pub fn handle_kinesis_event(
    event: &Value,
    config: &IngestConfig,
    store: &impl ObjectStore,
) -> IngestResponse {
    let summary = ingest_records(event, config, store);
    info!(
        component = "ingest_handler",
        event = "batch_completed",
        records_received = summary.records_received,
        records_written = summary.records_written,
        records_failed = summary.records_failed,
        key_mode = config.key_mode.as_str(),
        payload_encoding = config.payload_encoding.as_str(),
    );
    IngestResponse::processed()
}

/// Writes every record payload of `event` to the landing bucket, in order.
///
/// With the default `Raw` encoding the stored body is the `kinesis.data`
/// text exactly as delivered.
pub fn ingest_records(
    event: &Value,
    config: &IngestConfig,
    store: &impl ObjectStore,
) -> IngestSummary {
    let records = match decode_kinesis_records(event) {
        Ok(records) => records,
        Err(decode_error) => {
            warn!(
                component = "ingest_handler",
                event = "event_rejected",
                error = %decode_error,
            );
            return IngestSummary::default();
        }
    };

    let mut summary = IngestSummary {
        records_received: records.len(),
        ..IngestSummary::default()
    };

    for (position, record) in records.into_iter().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(decode_error) => {
                error!(
                    component = "ingest_handler",
                    event = "record_rejected",
                    position,
                    error = %decode_error,
                );
                summary.records_failed += 1;
                continue;
            }
        };

        let payload = match record.payload(config.payload_encoding) {
            Ok(payload) => payload,
            Err(decode_error) => {
                error!(
                    component = "ingest_handler",
                    event = "record_rejected",
                    position,
                    sequence_number = record.sequence_number().unwrap_or_default(),
                    error = %decode_error,
                );
                summary.records_failed += 1;
                continue;
            }
        };

        info!(
            component = "ingest_handler",
            event = "payload_received",
            position,
            sequence_number = record.sequence_number().unwrap_or_default(),
            "Decoded payload: {}",
            String::from_utf8_lossy(&payload),
        );

        let key = landing_object_key(&config.key_mode, &record, &payload);
        match store.put_object(&config.landing_bucket, &key, &payload) {
            Ok(()) => {
                info!(
                    component = "ingest_handler",
                    event = "record_written",
                    position,
                    bucket = %config.landing_bucket,
                    key = %key,
                    bytes = payload.len(),
                );
                summary.records_written += 1;
            }
            Err(store_error) => {
                error!(
                    component = "ingest_handler",
                    event = "record_write_failed",
                    position,
                    key = %key,
                    error = %store_error,
                );
                summary.records_failed += 1;
            }
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(values: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = values
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        move |name| values.get(name).cloned()
    }

    #[test]
    fn config_defaults_to_per_record_keys() {
        let config = IngestConfig::from_lookup(lookup(&[])).expect("config");
        assert_eq!(config.landing_bucket, DEFAULT_LANDING_BUCKET);
        assert_eq!(config.key_mode, LandingKeyMode::default());
        assert_eq!(config.payload_encoding, PayloadEncoding::Raw);
    }

    #[test]
    fn config_reads_decoded_payload_encoding() {
        let config =
            IngestConfig::from_lookup(lookup(&[(ENV_LANDING_PAYLOAD_ENCODING, "decoded")]))
                .expect("config");
        assert_eq!(config.payload_encoding, PayloadEncoding::Decoded);
    }

    #[test]
    fn config_reads_fixed_mode_overrides() {
        let config = IngestConfig::from_lookup(lookup(&[
            (ENV_LANDING_BUCKET, "raw-events"),
            (ENV_LANDING_KEY_MODE, "fixed"),
            (ENV_LANDING_FIXED_KEY, "latest"),
        ]))
        .expect("config");

        assert_eq!(config.landing_bucket, "raw-events");
        assert_eq!(
            config.key_mode,
            LandingKeyMode::Fixed {
                key: "latest".to_string()
            }
        );
    }

    #[test]
    fn config_rejects_unknown_key_mode() {
        let error = IngestConfig::from_lookup(lookup(&[(ENV_LANDING_KEY_MODE, "hourly")]))
            .expect_err("unknown mode");
        assert!(error.to_string().starts_with("LANDING_KEY_MODE is invalid"));
    }
}
