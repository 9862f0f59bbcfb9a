// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Mock catalog implementation for testing
//!
//! Provides an in-memory catalog with builder pattern for easy test setup.
//! Besides serving tables it can fail or stall selected lookups, and records
//! every table it was asked for.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use querymodel_catalog::{
    Catalog, CatalogError, CatalogLookup, CatalogResult, ColumnMetadata, DataType, TableMetadata,
    TableType,
};
use tokio::sync::Notify;

/// Holds a catalog lookup until the test releases it
#[derive(Debug, Default)]
pub struct Gate {
    /// Signalled when a gated lookup starts waiting
    pub entered: Notify,
    /// Notify once to let one gated lookup finish
    pub release: Notify,
}

impl Gate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

/// In-memory mock catalog for testing
#[derive(Debug, Clone, Default)]
pub struct MockCatalog {
    tables: HashMap<String, TableMetadata>,
    failing: HashSet<String>,
    gates: HashMap<String, Arc<Gate>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockCatalog {
    /// Create a new empty mock catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table to the catalog
    pub fn add_table(mut self, table: TableMetadata) -> Self {
        self.tables.insert(table.name.to_ascii_lowercase(), table);
        self
    }

    /// Get a table by name, ignoring case
    pub fn get_table(&self, name: &str) -> Option<&TableMetadata> {
        self.tables.get(&name.to_ascii_lowercase())
    }

    /// Table names requested through [`Catalog`], in request order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn record(&self, table: &str) {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(table.to_string());
        }
    }
}

#[async_trait::async_trait]
impl Catalog for MockCatalog {
    async fn list_tables(&self) -> CatalogResult<Vec<TableMetadata>> {
        Ok(self.tables.values().cloned().collect())
    }

    async fn get_columns(&self, table: &str) -> CatalogResult<Vec<ColumnMetadata>> {
        self.get_table(table)
            .map(|t| t.columns.clone())
            .ok_or_else(|| CatalogError::TableNotFound(table.to_string(), "mock".to_string()))
    }

    async fn get_table(&self, table: &str) -> CatalogResult<Option<TableMetadata>> {
        let key = table.to_ascii_lowercase();
        self.record(&key);

        if let Some(gate) = self.gates.get(&key) {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        if self.failing.contains(&key) {
            return Err(CatalogError::QueryTimeout(1));
        }
        Ok(self.tables.get(&key).cloned())
    }
}

impl CatalogLookup for MockCatalog {
    fn table_columns(&self, table: &str) -> Option<Vec<(String, DataType)>> {
        self.get_table(table).map(TableMetadata::column_types)
    }
}

/// Builder for creating mock catalogs with a fluent API
#[derive(Debug, Default)]
pub struct MockCatalogBuilder {
    catalog: MockCatalog,
}

impl MockCatalogBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the standard test schema (users, orders and products tables)
    pub fn with_standard_schema(mut self) -> Self {
        self.catalog = self
            .catalog
            .add_table(
                TableMetadata::new("users", "myapp")
                    .with_columns(vec![
                        ColumnMetadata::new("id", DataType::BigInt)
                            .with_nullable(false)
                            .with_primary_key(),
                        ColumnMetadata::new("email", DataType::Varchar(Some(255)))
                            .with_nullable(false),
                        ColumnMetadata::new("name", DataType::Varchar(Some(100)))
                            .with_nullable(true),
                        ColumnMetadata::new("created_at", DataType::Timestamp)
                            .with_nullable(true),
                    ])
                    .with_row_count(50000)
                    .with_comment("User account information"),
            )
            .add_table(
                TableMetadata::new("orders", "myapp")
                    .with_columns(vec![
                        ColumnMetadata::new("id", DataType::BigInt)
                            .with_nullable(false)
                            .with_primary_key(),
                        ColumnMetadata::new("user_id", DataType::BigInt)
                            .with_nullable(false)
                            .with_foreign_key("users", "id"),
                        ColumnMetadata::new("total", DataType::Decimal).with_nullable(true),
                        ColumnMetadata::new("status", DataType::Varchar(Some(50)))
                            .with_nullable(false),
                        ColumnMetadata::new("created_at", DataType::Timestamp)
                            .with_nullable(true),
                    ])
                    .with_row_count(100000)
                    .with_type(TableType::Table),
            )
            .add_table(
                TableMetadata::new("products", "myapp")
                    .with_columns(vec![
                        ColumnMetadata::new("id", DataType::BigInt)
                            .with_nullable(false)
                            .with_primary_key(),
                        ColumnMetadata::new("name", DataType::Varchar(Some(255)))
                            .with_nullable(false),
                        ColumnMetadata::new("price", DataType::Decimal).with_nullable(false),
                        ColumnMetadata::new("stock", DataType::Integer).with_nullable(true),
                    ])
                    .with_row_count(10000),
            );

        self
    }

    /// Add a custom table
    pub fn with_table(mut self, table: TableMetadata) -> Self {
        self.catalog = self.catalog.add_table(table);
        self
    }

    /// Add a table from `(name, type)` pairs in the `public` schema
    pub fn with_columns(self, table: &str, columns: &[(&str, DataType)]) -> Self {
        let columns = columns
            .iter()
            .map(|(name, data_type)| ColumnMetadata::new(*name, data_type.clone()))
            .collect();
        self.with_table(TableMetadata::new(table, "public").with_columns(columns))
    }

    /// Make lookups of `table` fail as if the source timed out
    pub fn with_failure(mut self, table: &str) -> Self {
        self.catalog.failing.insert(table.to_ascii_lowercase());
        self
    }

    /// Hold lookups of `table` until the gate is released
    pub fn with_gate(mut self, table: &str, gate: Arc<Gate>) -> Self {
        self.catalog.gates.insert(table.to_ascii_lowercase(), gate);
        self
    }

    /// Build the mock catalog
    pub fn build(self) -> MockCatalog {
        self.catalog
    }
}
