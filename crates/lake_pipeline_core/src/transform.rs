use std::sync::Arc;

use arrow::array::{ArrayRef, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, FieldRef, Schema, SchemaRef};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;

use crate::catalog::{arrow_type_for, CatalogColumn, CatalogError};

/// Returns `schema` with every field named `old_name` renamed to `new_name`.
///
/// Field order, types, nullability, and metadata are kept. A schema without
/// `old_name` is returned unchanged.
pub fn rename_schema_field(schema: &SchemaRef, old_name: &str, new_name: &str) -> SchemaRef {
    if old_name == new_name || schema.fields().iter().all(|field| field.name() != old_name) {
        return schema.clone();
    }

    let fields: Vec<FieldRef> = schema
        .fields()
        .iter()
        .map(|field| {
            if field.name() == old_name {
                Arc::new((**field).clone().with_name(new_name))
            } else {
                field.clone()
            }
        })
        .collect();

    Arc::new(Schema::new_with_metadata(fields, schema.metadata().clone()))
}

/// Renames a column of `batch` without touching its values.
pub fn rename_column(
    batch: &RecordBatch,
    old_name: &str,
    new_name: &str,
) -> Result<RecordBatch, ArrowError> {
    let schema = rename_schema_field(&batch.schema(), old_name, new_name);
    RecordBatch::try_new(schema, batch.columns().to_vec())
}

/// `__HIVE_DEFAULT_PARTITION__` marks a null partition value.
pub const HIVE_DEFAULT_PARTITION: &str = "__HIVE_DEFAULT_PARTITION__";

/// One partition key of a table with the value read from an object path.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionValue {
    pub name: String,
    pub data_type: DataType,
    pub value: Option<String>,
}

/// Reads Hive-style `key=value` partition values for `partition_keys` from an
/// object key relative to the table prefix. Missing keys yield `None`.
pub fn partition_values(
    object_key: &str,
    table_prefix: &str,
    partition_keys: &[CatalogColumn],
) -> Result<Vec<PartitionValue>, CatalogError> {
    let relative = object_key.strip_prefix(table_prefix).unwrap_or(object_key);
    let mut segments: Vec<(&str, &str)> = relative
        .split('/')
        .filter_map(|segment| segment.split_once('='))
        .collect();
    // the innermost directory wins when a key repeats
    segments.reverse();

    partition_keys
        .iter()
        .map(|key| {
            let data_type = arrow_type_for(&key.data_type).ok_or_else(|| {
                CatalogError::UnsupportedColumnType {
                    column: key.name.clone(),
                    data_type: key.data_type.clone(),
                }
            })?;
            let value = segments
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(&key.name))
                .map(|(_, value)| *value)
                .filter(|value| *value != HIVE_DEFAULT_PARTITION)
                .map(str::to_string);
            Ok(PartitionValue {
                name: key.name.clone(),
                data_type,
                value,
            })
        })
        .collect()
}

/// Appends one column per partition value, repeating the value for every
/// row of `batch`. Values are cast to the partition key's type; a value that
/// does not parse becomes null.
pub fn append_partition_columns(
    batch: &RecordBatch,
    values: &[PartitionValue],
) -> Result<RecordBatch, ArrowError> {
    if values.is_empty() {
        return Ok(batch.clone());
    }

    let schema = schema_with_partition_columns(&batch.schema(), values);
    let mut columns: Vec<ArrayRef> = batch.columns().to_vec();
    for partition in values {
        let text: ArrayRef = Arc::new(StringArray::from(vec![
            partition.value.as_deref();
            batch.num_rows()
        ]));
        let column = if partition.data_type == DataType::Utf8 {
            text
        } else {
            cast(&text, &partition.data_type)?
        };
        columns.push(column);
    }

    RecordBatch::try_new(schema, columns)
}

/// Schema of [`append_partition_columns`] output, for objects with no rows.
pub fn schema_with_partition_columns(schema: &SchemaRef, values: &[PartitionValue]) -> SchemaRef {
    if values.is_empty() {
        return schema.clone();
    }

    let mut fields: Vec<FieldRef> = schema.fields().iter().cloned().collect();
    for partition in values {
        fields.push(Arc::new(Field::new(
            partition.name.as_str(),
            partition.data_type.clone(),
            true,
        )));
    }
    Arc::new(Schema::new_with_metadata(fields, schema.metadata().clone()))
}
