// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Catalog trait for database schema abstraction

use crate::error::{CatalogError, CatalogResult};
use crate::metadata::{ColumnMetadata, TableMetadata};

/// Async schema source
///
/// Implementations can connect to live databases, read from static files, or
/// wrap caches. The semantic layer never calls this during a propagation pass;
/// see [`crate::CatalogSnapshot::prefetch`].
///
/// # Examples
///
/// ```rust,ignore
/// let columns = catalog.get_columns("users").await?;
/// for column in columns {
///     println!("{}: {}", column.name, column.data_type);
/// }
/// ```
#[async_trait::async_trait]
pub trait Catalog: Send + Sync {
    /// List all tables (base tables, views, materialized views)
    async fn list_tables(&self) -> CatalogResult<Vec<TableMetadata>>;

    /// Get column metadata for a specific table
    ///
    /// `table` may carry a schema qualifier (`schema.table`).
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::TableNotFound` if the table doesn't exist.
    async fn get_columns(&self, table: &str) -> CatalogResult<Vec<ColumnMetadata>>;

    /// Fetch a table together with its columns, `None` when it does not exist
    async fn get_table(&self, table: &str) -> CatalogResult<Option<TableMetadata>> {
        match self.get_columns(table).await {
            Ok(columns) => {
                let (schema, name) = match table.rsplit_once('.') {
                    Some((schema, name)) => (schema, name),
                    None => ("", table),
                };
                Ok(Some(TableMetadata::new(name, schema).with_columns(columns)))
            }
            Err(CatalogError::TableNotFound(_, _)) => Ok(None),
            Err(err) => Err(err),
        }
    }
}
