// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Static Catalog
//!
//! In-memory catalog with predefined schema data, built in code or loaded from
//! a YAML/JSON schema description.
//!
//! ## Schema file format
//!
//! ```yaml
//! schema: public
//! tables:
//!   - name: users
//!     columns:
//!       - { name: id, type: Integer, primary_key: true }
//!       - { name: name, type: Text, nullable: true }
//! ```

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

use crate::metadata::{ColumnMetadata, DataType, TableMetadata};
use crate::{Catalog, CatalogError, CatalogResult};

const DEFAULT_SCHEMA: &str = "public";

#[derive(Debug, Deserialize)]
struct SchemaFile {
    #[serde(default)]
    schema: Option<String>,
    tables: Vec<TableDef>,
}

#[derive(Debug, Deserialize)]
struct TableDef {
    name: String,
    #[serde(default)]
    schema: Option<String>,
    #[serde(default)]
    comment: Option<String>,
    columns: Vec<ColumnDef>,
}

#[derive(Debug, Deserialize)]
struct ColumnDef {
    name: String,
    #[serde(rename = "type")]
    data_type: DataType,
    #[serde(default)]
    nullable: bool,
    #[serde(default)]
    primary_key: bool,
}

/// Static catalog keyed by lower-cased table name
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    tables: HashMap<String, TableMetadata>,
}

impl StaticCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog from table metadata
    pub fn from_tables(tables: impl IntoIterator<Item = TableMetadata>) -> Self {
        let mut catalog = Self::new();
        for table in tables {
            catalog.insert(table);
        }
        catalog
    }

    /// Small users/orders/order_items schema used by demos and tests
    pub fn playground() -> Self {
        Self::from_tables(vec![
            TableMetadata::new("users", "playground")
                .with_columns(vec![
                    ColumnMetadata::new("id", DataType::Integer).with_primary_key(),
                    ColumnMetadata::new("name", DataType::Varchar(Some(100))),
                    ColumnMetadata::new("email", DataType::Varchar(Some(255))),
                    ColumnMetadata::new("created_at", DataType::Timestamp).with_nullable(true),
                ])
                .with_comment("User accounts table"),
            TableMetadata::new("orders", "playground")
                .with_columns(vec![
                    ColumnMetadata::new("id", DataType::Integer).with_primary_key(),
                    ColumnMetadata::new("user_id", DataType::Integer)
                        .with_foreign_key("users", "id"),
                    ColumnMetadata::new("total", DataType::Decimal),
                    ColumnMetadata::new("status", DataType::Varchar(Some(20)))
                        .with_nullable(true)
                        .with_default("'pending'"),
                ])
                .with_comment("Customer orders table"),
            TableMetadata::new("order_items", "playground")
                .with_columns(vec![
                    ColumnMetadata::new("id", DataType::Integer).with_primary_key(),
                    ColumnMetadata::new("order_id", DataType::Integer)
                        .with_foreign_key("orders", "id"),
                    ColumnMetadata::new("quantity", DataType::Integer),
                    ColumnMetadata::new("price", DataType::Decimal),
                ])
                .with_comment("Order line items table"),
        ])
    }

    /// Load a schema description from JSON
    pub fn from_json(source: &str) -> CatalogResult<Self> {
        let file: SchemaFile = serde_json::from_str(source)?;
        Ok(Self::from_schema_file(file))
    }

    /// Load a schema description from YAML
    pub fn from_yaml(source: &str) -> CatalogResult<Self> {
        let file: SchemaFile = serde_yaml::from_str(source)?;
        Ok(Self::from_schema_file(file))
    }

    /// Add or replace a table
    pub fn insert(&mut self, table: TableMetadata) {
        self.tables.insert(table.name.to_ascii_lowercase(), table);
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    fn from_schema_file(file: SchemaFile) -> Self {
        let default_schema = file.schema.unwrap_or_else(|| DEFAULT_SCHEMA.to_string());
        Self::from_tables(file.tables.into_iter().map(|def| {
            let columns = def
                .columns
                .into_iter()
                .map(|c| {
                    let column = ColumnMetadata::new(c.name, c.data_type).with_nullable(c.nullable);
                    if c.primary_key {
                        column.with_primary_key()
                    } else {
                        column
                    }
                })
                .collect();
            let table = TableMetadata::new(def.name, def.schema.unwrap_or_else(|| default_schema.clone()))
                .with_columns(columns);
            match def.comment {
                Some(comment) => table.with_comment(comment),
                None => table,
            }
        }))
    }

    pub(crate) fn lookup(&self, table: &str) -> Option<&TableMetadata> {
        let key = table.to_ascii_lowercase();
        if let Some(found) = self.tables.get(&key) {
            return Some(found);
        }
        // schema.table
        let (schema, name) = key.rsplit_once('.')?;
        self.tables
            .get(name)
            .filter(|t| t.schema.eq_ignore_ascii_case(schema))
    }
}

#[async_trait]
impl Catalog for StaticCatalog {
    async fn list_tables(&self) -> CatalogResult<Vec<TableMetadata>> {
        let mut tables: Vec<TableMetadata> = self.tables.values().cloned().collect();
        tables.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tables)
    }

    async fn get_columns(&self, table: &str) -> CatalogResult<Vec<ColumnMetadata>> {
        self.lookup(table)
            .map(|t| t.columns.clone())
            .ok_or_else(|| CatalogError::TableNotFound(table.to_string(), DEFAULT_SCHEMA.to_string()))
    }

    async fn get_table(&self, table: &str) -> CatalogResult<Option<TableMetadata>> {
        Ok(self.lookup(table).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_playground_catalog() {
        let catalog = StaticCatalog::playground();
        let tables = catalog.list_tables().await.unwrap();
        assert_eq!(tables.len(), 3);
        assert_eq!(tables[0].name, "order_items");
    }

    #[tokio::test]
    async fn test_get_columns_case_insensitive() {
        let catalog = StaticCatalog::playground();
        let columns = catalog.get_columns("USERS").await.unwrap();
        assert_eq!(columns.len(), 4);
        assert_eq!(columns[0].name, "id");
    }

    #[tokio::test]
    async fn test_schema_qualified_lookup() {
        let catalog = StaticCatalog::playground();
        assert!(catalog.get_table("playground.orders").await.unwrap().is_some());
        assert!(catalog.get_table("other.orders").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_table_not_found() {
        let catalog = StaticCatalog::playground();
        let result = catalog.get_columns("nonexistent").await;
        assert!(matches!(result, Err(CatalogError::TableNotFound(_, _))));
    }

    #[tokio::test]
    async fn test_from_yaml() {
        let yaml = r#"
schema: app
tables:
  - name: accounts
    columns:
      - { name: id, type: Integer, primary_key: true }
      - { name: owner, type: Text, nullable: true }
"#;
        let catalog = StaticCatalog::from_yaml(yaml).unwrap();
        let table = catalog.get_table("accounts").await.unwrap().unwrap();
        assert_eq!(table.schema, "app");
        assert_eq!(table.columns.len(), 2);
        assert!(table.columns[0].is_primary_key);
        assert!(table.columns[1].nullable);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let result = StaticCatalog::from_json("{ not json");
        assert!(matches!(result, Err(CatalogError::SerializationError(_))));
    }
}
