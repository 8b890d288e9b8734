use std::collections::HashMap;

use aws_sdk_glue::error::DisplayErrorContext;
use aws_sdk_glue::types::{Column, Table};
use lake_pipeline_core::catalog::{
    CatalogColumn, CatalogError, CatalogTable, S3Location, TableFormat,
};

use crate::adapters::block_on_sdk;
use crate::adapters::catalog::TableCatalog;

const DEFAULT_COLUMN_TYPE: &str = "string";

/// Glue Data Catalog lookups through the AWS SDK.
#[derive(Debug, Clone)]
pub struct GlueTableCatalog {
    client: aws_sdk_glue::Client,
}

impl GlueTableCatalog {
    pub fn new(client: aws_sdk_glue::Client) -> Self {
        Self { client }
    }
}

impl TableCatalog for GlueTableCatalog {
    fn get_table(&self, database: &str, table: &str) -> Result<CatalogTable, CatalogError> {
        let client = self.client.clone();
        let not_found = || CatalogError::TableNotFound {
            database: database.to_string(),
            table: table.to_string(),
        };

        let output = block_on_sdk(async move {
            client
                .get_table()
                .database_name(database)
                .name(table)
                .send()
                .await
        })
        .map_err(|error| {
            let missing = error
                .as_service_error()
                .map(|service_error| service_error.is_entity_not_found_exception())
                .unwrap_or(false);
            if missing {
                not_found()
            } else {
                CatalogError::Request(DisplayErrorContext(&error).to_string())
            }
        })?;

        let glue_table = output.table().ok_or_else(not_found)?;
        catalog_table_from_glue(database, glue_table)
    }
}

/// Converts a Glue table definition into the storage details the curate job
/// reads from.
pub fn catalog_table_from_glue(
    database: &str,
    table: &Table,
) -> Result<CatalogTable, CatalogError> {
    let missing_location = || CatalogError::MissingLocation {
        database: database.to_string(),
        table: table.name().to_string(),
    };

    let storage = table.storage_descriptor().ok_or_else(missing_location)?;
    let location = storage
        .location()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(missing_location)?;
    let location = S3Location::parse(location)?;

    let table_parameters = table.parameters();
    let serde_info = storage.serde_info();
    let serde_parameters = serde_info.and_then(|info| info.parameters());

    let format = TableFormat::detect(
        parameter(table_parameters, "classification"),
        serde_info.and_then(|info| info.serialization_library()),
        storage.input_format(),
    )?;

    let has_header = parameter(table_parameters, "skip.header.line.count")
        .or_else(|| parameter(serde_parameters, "skip.header.line.count"))
        .and_then(|value| value.trim().parse::<u32>().ok())
        .map(|count| count > 0)
        .unwrap_or(false);

    let delimiter = parameter(serde_parameters, "field.delim")
        .or_else(|| parameter(serde_parameters, "separatorChar"))
        .and_then(|value| value.as_bytes().first().copied())
        .unwrap_or(b',');

    Ok(CatalogTable {
        database: database.to_string(),
        name: table.name().to_string(),
        location,
        format,
        columns: catalog_columns(storage.columns()),
        partition_keys: catalog_columns(table.partition_keys()),
        has_header,
        delimiter,
    })
}

fn parameter<'a>(parameters: Option<&'a HashMap<String, String>>, key: &str) -> Option<&'a str> {
    parameters
        .and_then(|values| values.get(key))
        .map(String::as_str)
}

fn catalog_columns(columns: &[Column]) -> Vec<CatalogColumn> {
    columns
        .iter()
        .map(|column| {
            CatalogColumn::new(
                column.name(),
                column.r#type().unwrap_or(DEFAULT_COLUMN_TYPE),
            )
        })
        .collect()
}
