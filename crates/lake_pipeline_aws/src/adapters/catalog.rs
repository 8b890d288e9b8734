use std::collections::BTreeMap;

use lake_pipeline_core::catalog::{CatalogError, CatalogTable};

pub trait TableCatalog {
    fn get_table(&self, database: &str, table: &str) -> Result<CatalogTable, CatalogError>;
}

/// Catalog backed by a fixed set of table definitions.
#[derive(Debug, Default, Clone)]
pub struct StaticTableCatalog {
    tables: BTreeMap<(String, String), CatalogTable>,
}

impl StaticTableCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: CatalogTable) -> Self {
        self.tables
            .insert((table.database.clone(), table.name.clone()), table);
        self
    }
}

impl TableCatalog for StaticTableCatalog {
    fn get_table(&self, database: &str, table: &str) -> Result<CatalogTable, CatalogError> {
        self.tables
            .get(&(database.to_string(), table.to_string()))
            .cloned()
            .ok_or_else(|| CatalogError::TableNotFound {
                database: database.to_string(),
                table: table.to_string(),
            })
    }
}
