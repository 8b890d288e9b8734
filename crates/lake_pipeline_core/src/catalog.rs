use std::sync::Arc;

use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("table {database}.{table} was not found in the catalog")]
    TableNotFound { database: String, table: String },
    #[error("table {database}.{table} has no storage location")]
    MissingLocation { database: String, table: String },
    #[error("invalid storage location '{0}' (expected s3://bucket/prefix)")]
    InvalidLocation(String),
    #[error("unsupported table format '{0}' (expected parquet, csv, or json)")]
    UnsupportedFormat(String),
    #[error("column '{column}' has unsupported type '{data_type}'")]
    UnsupportedColumnType { column: String, data_type: String },
    #[error("catalog request failed: {0}")]
    Request(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    Parquet,
    Csv,
    Json,
}

impl TableFormat {
    /// Resolves the storage format from the table `classification` parameter,
    /// falling back to the SerDe or input format class names.
    pub fn detect(
        classification: Option<&str>,
        serialization_library: Option<&str>,
        input_format: Option<&str>,
    ) -> Result<Self, CatalogError> {
        if let Some(raw) = classification {
            return Self::parse(raw);
        }

        let hints = [serialization_library, input_format];
        for hint in hints.into_iter().flatten() {
            let lowered = hint.to_ascii_lowercase();
            if lowered.contains("parquet") {
                return Ok(Self::Parquet);
            }
            if lowered.contains("json") {
                return Ok(Self::Json);
            }
            if lowered.contains("csv")
                || lowered.contains("lazysimpleserde")
                || lowered.contains("textinputformat")
            {
                return Ok(Self::Csv);
            }
        }

        Err(CatalogError::UnsupportedFormat(
            serialization_library
                .or(input_format)
                .unwrap_or("unknown")
                .to_string(),
        ))
    }

    pub fn parse(raw: &str) -> Result<Self, CatalogError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "parquet" => Ok(Self::Parquet),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(CatalogError::UnsupportedFormat(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogColumn {
    pub name: String,
    pub data_type: String,
}

impl CatalogColumn {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// Location of a table or object prefix in S3.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3Location {
    pub bucket: String,
    pub prefix: String,
}

impl S3Location {
    /// Parses `s3://bucket/prefix`; `s3a://` and `s3n://` are accepted too.
    /// The prefix is normalised to end with `/` unless it is empty.
    pub fn parse(raw: &str) -> Result<Self, CatalogError> {
        let trimmed = raw.trim();
        let rest = ["s3://", "s3a://", "s3n://"]
            .iter()
            .find_map(|scheme| trimmed.strip_prefix(scheme))
            .ok_or_else(|| CatalogError::InvalidLocation(raw.to_string()))?;

        let (bucket, prefix) = rest.split_once('/').unwrap_or((rest, ""));
        if bucket.is_empty() {
            return Err(CatalogError::InvalidLocation(raw.to_string()));
        }

        let prefix = prefix.trim_matches('/');
        let prefix = if prefix.is_empty() {
            String::new()
        } else {
            format!("{prefix}/")
        };

        Ok(Self {
            bucket: bucket.to_string(),
            prefix,
        })
    }
}

impl std::fmt::Display for S3Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.prefix)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogTable {
    pub database: String,
    pub name: String,
    pub location: S3Location,
    pub format: TableFormat,
    pub columns: Vec<CatalogColumn>,
    pub partition_keys: Vec<CatalogColumn>,
    /// Whether delimited files start with a header row.
    pub has_header: bool,
    pub delimiter: u8,
}

impl CatalogTable {
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.database, self.name)
    }

    /// Arrow schema of the data columns stored in each file. Partition keys
    /// are not part of it; they live in the object path.
    pub fn data_schema(&self) -> Result<SchemaRef, CatalogError> {
        let fields = self
            .columns
            .iter()
            .map(|column| {
                arrow_type_for(&column.data_type)
                    .map(|data_type| Field::new(column.name.as_str(), data_type, true))
                    .ok_or_else(|| CatalogError::UnsupportedColumnType {
                        column: column.name.clone(),
                        data_type: column.data_type.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Arc::new(Schema::new(fields)))
    }
}

/// Maps a Hive column type string to the Arrow type used when decoding text
/// formats. Nested types have no text decoding and map to `None`.
pub fn arrow_type_for(hive_type: &str) -> Option<DataType> {
    let lowered = hive_type.trim().to_ascii_lowercase();
    let base = lowered.split('(').next().unwrap_or_default().trim();

    let data_type = match base {
        "string" | "varchar" | "char" => DataType::Utf8,
        "tinyint" => DataType::Int8,
        "smallint" => DataType::Int16,
        "int" | "integer" => DataType::Int32,
        "bigint" => DataType::Int64,
        "float" => DataType::Float32,
        "double" => DataType::Float64,
        "boolean" => DataType::Boolean,
        "date" => DataType::Date32,
        "timestamp" => DataType::Timestamp(TimeUnit::Microsecond, None),
        "binary" => DataType::Binary,
        "decimal" => parse_decimal(&lowered)?,
        _ => return None,
    };

    Some(data_type)
}

fn parse_decimal(lowered: &str) -> Option<DataType> {
    let Some(arguments) = lowered
        .split_once('(')
        .and_then(|(_, rest)| rest.strip_suffix(')'))
    else {
        return Some(DataType::Decimal128(10, 0));
    };

    let (precision, scale) = arguments.split_once(',').unwrap_or((arguments, "0"));
    let precision: u8 = precision.trim().parse().ok()?;
    let scale: i8 = scale.trim().parse().ok()?;
    Some(DataType::Decimal128(precision, scale))
}
