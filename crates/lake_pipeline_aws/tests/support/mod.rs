#![allow(dead_code)]

use std::sync::Arc;

use arrow::array::{ArrayRef, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use lake_pipeline_aws::adapters::object_store::{ObjectStore, StoreError};
use lake_pipeline_core::catalog::{CatalogColumn, CatalogTable, S3Location, TableFormat};
use lake_pipeline_core::codec::encode_parquet;
use serde_json::{json, Value};

pub const STREAM_ARN: &str = "arn:aws:kinesis:eu-west-1:123456789012:stream/click-events";

/// `kinesis.data` text for `payload`, as the stream delivers it.
pub fn encoded(payload: &[u8]) -> String {
    STANDARD.encode(payload)
}

pub fn kinesis_record(payload: &[u8], sequence_number: &str) -> Value {
    json!({
        "eventSource": "aws:kinesis",
        "eventVersion": "1.0",
        "eventID": format!("shardId-000000000000:{sequence_number}"),
        "eventName": "aws:kinesis:record",
        "eventSourceARN": STREAM_ARN,
        "awsRegion": "eu-west-1",
        "kinesis": {
            "kinesisSchemaVersion": "1.0",
            "partitionKey": "partition-1",
            "sequenceNumber": sequence_number,
            "data": encoded(payload),
            "approximateArrivalTimestamp": 1_760_832_000.25
        }
    })
}

pub fn kinesis_event(records: Vec<Value>) -> Value {
    json!({ "Records": records })
}

/// Store whose writes and deletes always fail.
pub struct UnavailableStore;

impl ObjectStore for UnavailableStore {
    fn put_object(&self, bucket: &str, key: &str, _body: &[u8]) -> Result<(), StoreError> {
        Err(StoreError::Request {
            operation: "write",
            bucket: bucket.to_string(),
            key: key.to_string(),
            message: "service unavailable".to_string(),
        })
    }

    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        Err(StoreError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }

    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        Err(StoreError::Request {
            operation: "delete",
            bucket: bucket.to_string(),
            key: key.to_string(),
            message: "service unavailable".to_string(),
        })
    }

    fn list_objects(&self, _bucket: &str, _prefix: &str) -> Result<Vec<String>, StoreError> {
        Ok(Vec::new())
    }
}

pub fn events_table(format: TableFormat, partition_keys: Vec<CatalogColumn>) -> CatalogTable {
    CatalogTable {
        database: "landing".to_string(),
        name: "landing_data".to_string(),
        location: S3Location::parse("s3://landing-bucket/events/").expect("valid location"),
        format,
        columns: vec![
            CatalogColumn::new("id", "bigint"),
            CatalogColumn::new("old_column_name", "string"),
            CatalogColumn::new("note", "string"),
        ],
        partition_keys,
        has_header: true,
        delimiter: b',',
    }
}

pub fn events_parquet(ids: &[i64], values: &[Option<&str>]) -> Vec<u8> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("old_column_name", DataType::Utf8, true),
        Field::new("note", DataType::Utf8, true),
    ]));
    let notes: Vec<Option<&str>> = ids.iter().map(|_| Some("n")).collect();
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(ids.to_vec())) as ArrayRef,
            Arc::new(StringArray::from(values.to_vec())),
            Arc::new(StringArray::from(notes)),
        ],
    )
    .expect("fixture batch");
    encode_parquet(schema, &[batch]).expect("fixture parquet")
}
