use std::io::Cursor;

use arrow::datatypes::SchemaRef;
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::errors::ParquetError;
use parquet::file::properties::WriterProperties;
use thiserror::Error;

use crate::catalog::{CatalogError, CatalogTable, TableFormat};

pub const DEFAULT_BATCH_SIZE: usize = 8_192;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),
    #[error("parquet error: {0}")]
    Parquet(#[from] ParquetError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Record batches decoded from one source object, with the schema they share
/// even when the object holds no rows.
#[derive(Debug, Clone)]
pub struct DecodedObject {
    pub schema: SchemaRef,
    pub batches: Vec<RecordBatch>,
}

impl DecodedObject {
    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }
}

/// Decodes one object of `table` according to the table's storage format.
pub fn decode_table_object(
    table: &CatalogTable,
    body: impl Into<Bytes>,
) -> Result<DecodedObject, CodecError> {
    let body: Bytes = body.into();
    match table.format {
        TableFormat::Parquet => decode_parquet(body),
        TableFormat::Csv => decode_csv(
            body,
            table.data_schema()?,
            table.has_header,
            table.delimiter,
        ),
        TableFormat::Json => decode_json(body, table.data_schema()?),
    }
}

pub fn decode_parquet(body: impl Into<Bytes>) -> Result<DecodedObject, CodecError> {
    let body: Bytes = body.into();
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(body)?.with_batch_size(DEFAULT_BATCH_SIZE);
    let schema = builder.schema().clone();
    let reader = builder.build()?;
    let batches = reader.collect::<Result<Vec<_>, _>>()?;
    Ok(DecodedObject { schema, batches })
}

pub fn decode_csv(
    body: impl Into<Bytes>,
    schema: SchemaRef,
    has_header: bool,
    delimiter: u8,
) -> Result<DecodedObject, CodecError> {
    let body: Bytes = body.into();
    let reader = arrow::csv::ReaderBuilder::new(schema.clone())
        .with_header(has_header)
        .with_delimiter(delimiter)
        .with_batch_size(DEFAULT_BATCH_SIZE)
        .build(Cursor::new(body))?;
    let batches = reader.collect::<Result<Vec<_>, _>>()?;
    Ok(DecodedObject { schema, batches })
}

/// Decodes newline-delimited JSON objects.
pub fn decode_json(body: impl Into<Bytes>, schema: SchemaRef) -> Result<DecodedObject, CodecError> {
    let body: Bytes = body.into();
    let reader = arrow::json::ReaderBuilder::new(schema.clone())
        .with_batch_size(DEFAULT_BATCH_SIZE)
        .build(Cursor::new(body))?;
    let batches = reader.collect::<Result<Vec<_>, _>>()?;
    Ok(DecodedObject { schema, batches })
}

/// Encodes `batches` as one Snappy-compressed Parquet file held in memory.
pub fn encode_parquet(schema: SchemaRef, batches: &[RecordBatch]) -> Result<Vec<u8>, CodecError> {
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(Vec::new(), schema, Some(props))?;
    for batch in batches {
        writer.write(batch)?;
    }
    Ok(writer.into_inner()?)
}
