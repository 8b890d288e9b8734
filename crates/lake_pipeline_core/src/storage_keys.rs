use sha2::{Digest, Sha256};

use crate::contract::KinesisEventRecord;

pub const CURATED_OUTPUT_PREFIX: &str = "processed-data/";
pub const COMMIT_MARKER_NAME: &str = "_SUCCESS";
pub const DEFAULT_LANDING_FIXED_KEY: &str = "data_from_kinesis";
pub const DEFAULT_LANDING_PREFIX: &str = "data_from_kinesis";

const UNKNOWN_STREAM: &str = "unknown-stream";
const UNKNOWN_SHARD: &str = "unknown-shard";

pub fn curated_part_object_key(part_index: usize, job_run_id: &str) -> String {
    format!("{CURATED_OUTPUT_PREFIX}part-{part_index:05}-{job_run_id}.snappy.parquet")
}

pub fn commit_marker_object_key() -> String {
    format!("{CURATED_OUTPUT_PREFIX}{COMMIT_MARKER_NAME}")
}

/// Whether a listed object is skipped when reading a table: directory
/// markers and files whose name starts with `_` or `.`.
pub fn is_hidden_object_key(key: &str) -> bool {
    if key.is_empty() || key.ends_with('/') || key.ends_with("_$folder$") {
        return true;
    }

    let file_name = key.rsplit('/').next().unwrap_or(key);
    file_name.starts_with('_') || file_name.starts_with('.')
}

/// How the ingest handler names landing objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LandingKeyMode {
    /// Every record is written to the same key, so each write replaces the
    /// previous one and only the last record of a batch survives.
    Fixed { key: String },
    /// One object per record under `<prefix>/<stream>/<shard>/`.
    PerRecord { prefix: String },
}

impl LandingKeyMode {
    pub fn parse(raw: &str, fixed_key: &str, prefix: &str) -> Result<Self, String> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(Self::Fixed {
                key: fixed_key.to_string(),
            }),
            "per-record" | "per_record" | "record" => Ok(Self::PerRecord {
                prefix: prefix.to_string(),
            }),
            _ => Err(format!(
                "Unsupported landing key mode '{raw}' (expected fixed or per-record)"
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fixed { .. } => "fixed",
            Self::PerRecord { .. } => "per-record",
        }
    }
}

impl Default for LandingKeyMode {
    fn default() -> Self {
        Self::PerRecord {
            prefix: DEFAULT_LANDING_PREFIX.to_string(),
        }
    }
}

pub fn landing_object_key(
    mode: &LandingKeyMode,
    record: &KinesisEventRecord,
    payload: &[u8],
) -> String {
    match mode {
        LandingKeyMode::Fixed { key } => key.clone(),
        LandingKeyMode::PerRecord { prefix } => {
            let trimmed = prefix.trim_matches('/');
            let stream = record.stream_name().unwrap_or(UNKNOWN_STREAM);
            let shard = record.shard_id().unwrap_or(UNKNOWN_SHARD);
            let name = match record.sequence_number() {
                Some(sequence) if !sequence.is_empty() => sequence.to_string(),
                _ => format!("sha256-{}", content_hash(payload)),
            };
            if trimmed.is_empty() {
                format!("{stream}/{shard}/{name}")
            } else {
                format!("{trimmed}/{stream}/{shard}/{name}")
            }
        }
    }
}

pub fn content_hash(payload: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::KinesisRecord;

    fn record(sequence: Option<&str>) -> KinesisEventRecord {
        KinesisEventRecord {
            event_id: Some("shardId-000000000001:49590".to_string()),
            event_source_arn: Some(
                "arn:aws:kinesis:us-east-1:123456789012:stream/orders".to_string(),
            ),
            kinesis: KinesisRecord {
                data: "e30=".to_string(),
                sequence_number: sequence.map(str::to_string),
                partition_key: None,
                approximate_arrival_timestamp: None,
            },
        }
    }

    #[test]
    fn builds_curated_part_key() {
        assert_eq!(
            curated_part_object_key(3, "jr_abc"),
            "processed-data/part-00003-jr_abc.snappy.parquet"
        );
        assert_eq!(commit_marker_object_key(), "processed-data/_SUCCESS");
    }

    #[test]
    fn hides_markers_and_dot_files() {
        assert!(is_hidden_object_key("events/_SUCCESS"));
        assert!(is_hidden_object_key("events/.part-0.crc"));
        assert!(is_hidden_object_key("events/year=2026/"));
        assert!(is_hidden_object_key("events_$folder$"));
        assert!(!is_hidden_object_key("events/year=2026/part-0.parquet"));
    }

    #[test]
    fn fixed_mode_ignores_record_identity() {
        let mode = LandingKeyMode::Fixed {
            key: DEFAULT_LANDING_FIXED_KEY.to_string(),
        };
        assert_eq!(
            landing_object_key(&mode, &record(Some("1")), b"a"),
            landing_object_key(&mode, &record(Some("2")), b"b"),
        );
    }

    #[test]
    fn per_record_mode_keys_by_sequence_number() {
        let mode = LandingKeyMode::PerRecord {
            prefix: "landing/".to_string(),
        };
        assert_eq!(
            landing_object_key(&mode, &record(Some("49590")), b"{}"),
            "landing/orders/shardId-000000000001/49590"
        );
    }

    #[test]
    fn per_record_mode_falls_back_to_content_hash() {
        let mode = LandingKeyMode::default();
        let key = landing_object_key(&mode, &record(None), b"abc");
        assert_eq!(
            key,
            "data_from_kinesis/orders/shardId-000000000001/sha256-ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn parses_key_mode() {
        assert_eq!(
            LandingKeyMode::parse("FIXED", "k", "p"),
            Ok(LandingKeyMode::Fixed {
                key: "k".to_string()
            })
        );
        assert_eq!(
            LandingKeyMode::parse("per-record", "k", "p"),
            Ok(LandingKeyMode::PerRecord {
                prefix: "p".to_string()
            })
        );
        assert!(LandingKeyMode::parse("random", "k", "p").is_err());
    }
}
