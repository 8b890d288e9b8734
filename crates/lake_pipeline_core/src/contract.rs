use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const INGEST_SUCCESS_STATUS_CODE: u16 = 200;
pub const INGEST_SUCCESS_BODY: &str = "Data processed successfully";
pub const COMMIT_RECORD_SCHEMA_VERSION: &str = "v1";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    #[error("event must be a JSON object")]
    EventNotObject,
    #[error("event must include a Records array")]
    MissingRecords,
    #[error("malformed stream record: {0}")]
    MalformedRecord(String),
    #[error("record payload is not valid base64: {0}")]
    InvalidPayload(String),
}

/// How the ingest handler turns `kinesis.data` into the stored object body.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PayloadEncoding {
    /// The `data` field as delivered, byte for byte.
    #[default]
    Raw,
    /// The base64-decoded record bytes.
    Decoded,
}

impl PayloadEncoding {
    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(Self::Raw),
            "decoded" | "base64-decoded" => Ok(Self::Decoded),
            _ => Err(format!(
                "Unsupported payload encoding '{raw}' (expected raw or decoded)"
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Decoded => "decoded",
        }
    }
}

/// One record of a Kinesis stream event as delivered to the ingest handler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KinesisEventRecord {
    #[serde(rename = "eventID", default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(
        rename = "eventSourceARN",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub event_source_arn: Option<String>,
    pub kinesis: KinesisRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KinesisRecord {
    /// Base64-encoded record payload.
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approximate_arrival_timestamp: Option<f64>,
}

impl KinesisEventRecord {
    /// Object body for this record. `Raw` never fails.
    pub fn payload(&self, encoding: PayloadEncoding) -> Result<Vec<u8>, ContractError> {
        match encoding {
            PayloadEncoding::Raw => Ok(self.kinesis.data.as_bytes().to_vec()),
            PayloadEncoding::Decoded => self.decode_payload(),
        }
    }

    pub fn decode_payload(&self) -> Result<Vec<u8>, ContractError> {
        STANDARD
            .decode(self.kinesis.data.trim())
            .map_err(|error| ContractError::InvalidPayload(error.to_string()))
    }

    pub fn sequence_number(&self) -> Option<&str> {
        self.kinesis.sequence_number.as_deref()
    }

    /// Shard id carried in `eventID` (`shardId-000000000000:<sequence>`).
    pub fn shard_id(&self) -> Option<&str> {
        self.event_id
            .as_deref()
            .and_then(|event_id| event_id.split_once(':'))
            .map(|(shard_id, _)| shard_id)
            .filter(|shard_id| !shard_id.is_empty())
    }

    /// Stream name from `eventSourceARN` (`arn:aws:kinesis:...:stream/<name>`).
    pub fn stream_name(&self) -> Option<&str> {
        self.event_source_arn
            .as_deref()
            .and_then(|arn| arn.rsplit_once(":stream/"))
            .map(|(_, name)| name)
            .filter(|name| !name.is_empty())
    }
}

/// Splits a raw Lambda event into its stream records.
///
/// The event shape is checked once; each record is decoded on its own so one
/// malformed record does not hide the others.
pub fn decode_kinesis_records(
    event: &Value,
) -> Result<Vec<Result<KinesisEventRecord, ContractError>>, ContractError> {
    let object = event.as_object().ok_or(ContractError::EventNotObject)?;
    let records = object
        .get("Records")
        .and_then(Value::as_array)
        .ok_or(ContractError::MissingRecords)?;

    Ok(records
        .iter()
        .map(|record| {
            serde_json::from_value::<KinesisEventRecord>(record.clone())
                .map_err(|error| ContractError::MalformedRecord(error.to_string()))
        })
        .collect())
}

/// Response returned by the ingest handler for every invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl IngestResponse {
    pub fn processed() -> Self {
        Self {
            status_code: INGEST_SUCCESS_STATUS_CODE,
            body: INGEST_SUCCESS_BODY.to_string(),
        }
    }
}

/// Commit record persisted as the curate job's `_SUCCESS` marker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobCommitRecord {
    pub job_name: String,
    pub job_run_id: String,
    pub source_table: String,
    pub source_location: String,
    pub output_location: String,
    pub renamed_column: RenamedColumn,
    pub files_written: Vec<String>,
    pub rows_written: u64,
    pub committed_at: String,
    pub record_schema: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenamedColumn {
    pub from: String,
    pub to: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record_json(data: &str, sequence: &str) -> Value {
        json!({
            "eventSource": "aws:kinesis",
            "eventID": format!("shardId-000000000003:{sequence}"),
            "eventSourceARN": "arn:aws:kinesis:eu-west-1:123456789012:stream/click-events",
            "kinesis": {
                "kinesisSchemaVersion": "1.0",
                "partitionKey": "user-1",
                "sequenceNumber": sequence,
                "data": data,
                "approximateArrivalTimestamp": 1_760_000_000.5
            }
        })
    }

    #[test]
    fn decodes_record_identity_and_payload() {
        let event = json!({ "Records": [record_json("aGVsbG8=", "4959")] });
        let records = decode_kinesis_records(&event).expect("event shape");
        let record = records[0].as_ref().expect("record");

        assert_eq!(record.decode_payload().expect("base64"), b"hello");
        assert_eq!(record.sequence_number(), Some("4959"));
        assert_eq!(record.shard_id(), Some("shardId-000000000003"));
        assert_eq!(record.stream_name(), Some("click-events"));
        assert_eq!(record.kinesis.partition_key.as_deref(), Some("user-1"));
    }

    #[test]
    fn isolates_malformed_records() {
        let event = json!({
            "Records": [
                record_json("aGVsbG8=", "1"),
                {"kinesis": {"sequenceNumber": "2"}},
            ]
        });
        let records = decode_kinesis_records(&event).expect("event shape");

        assert!(records[0].is_ok());
        assert!(matches!(records[1], Err(ContractError::MalformedRecord(_))));
    }

    #[test]
    fn empty_records_array_is_an_empty_batch() {
        let records = decode_kinesis_records(&json!({"Records": []})).expect("event shape");
        assert!(records.is_empty());
    }

    #[test]
    fn rejects_event_without_records() {
        assert_eq!(
            decode_kinesis_records(&json!({"detail": {}})),
            Err(ContractError::MissingRecords)
        );
        assert_eq!(
            decode_kinesis_records(&json!("Records")),
            Err(ContractError::EventNotObject)
        );
    }

    #[test]
    fn reports_invalid_base64_payload() {
        let event = json!({ "Records": [record_json("not base64!", "1")] });
        let records = decode_kinesis_records(&event).expect("event shape");
        let error = records[0]
            .as_ref()
            .expect("record")
            .decode_payload()
            .expect_err("invalid payload");
        assert!(matches!(error, ContractError::InvalidPayload(_)));
    }

    #[test]
    fn raw_payload_keeps_data_field_text() {
        let event = json!({ "Records": [record_json("plain text payload", "1")] });
        let records = decode_kinesis_records(&event).expect("event shape");
        let record = records[0].as_ref().expect("record");

        assert_eq!(
            record.payload(PayloadEncoding::Raw).expect("raw payload"),
            b"plain text payload"
        );
        assert!(record.payload(PayloadEncoding::Decoded).is_err());
    }

    #[test]
    fn parses_payload_encoding() {
        assert_eq!(PayloadEncoding::parse("RAW"), Ok(PayloadEncoding::Raw));
        assert_eq!(PayloadEncoding::parse("decoded"), Ok(PayloadEncoding::Decoded));
        assert!(PayloadEncoding::parse("gzip").is_err());
        assert_eq!(PayloadEncoding::default(), PayloadEncoding::Raw);
    }

    #[test]
    fn processed_response_serializes_fixed_body() {
        let value = serde_json::to_value(IngestResponse::processed()).expect("serialize");
        assert_eq!(
            value,
            json!({"statusCode": 200, "body": "Data processed successfully"})
        );
    }
}
