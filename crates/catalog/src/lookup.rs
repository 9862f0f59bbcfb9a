// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Synchronous catalog lookup
//!
//! A propagation pass is a plain recursive walk with no suspension points, so
//! it reads schema through [`CatalogLookup`] rather than the async
//! [`Catalog`]. [`CatalogSnapshot::prefetch`] loads every table a query
//! mentions before the pass starts.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, instrument, warn};

use crate::metadata::{DataType, TableMetadata};
use crate::r#static::StaticCatalog;
use crate::Catalog;

/// Synchronous "does table T exist, and what are its columns" lookup
pub trait CatalogLookup: Send + Sync {
    /// Ordered `(column name, type)` pairs, or `None` if the table is unknown
    fn table_columns(&self, table: &str) -> Option<Vec<(String, DataType)>>;
}

/// Point-in-time copy of the tables a pass needs
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    tables: HashMap<String, TableMetadata>,
    missing: BTreeSet<String>,
}

impl CatalogSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot directly from metadata
    pub fn from_tables(tables: impl IntoIterator<Item = TableMetadata>) -> Self {
        let mut snapshot = Self::new();
        for table in tables {
            snapshot.insert(table);
        }
        snapshot
    }

    /// Fetch the given table names from an async catalog
    ///
    /// Names are de-duplicated case-insensitively. Source failures (timeouts,
    /// lost connections) are logged and the table is treated as unknown, so
    /// the analysis still runs and reports it as an unknown table.
    #[instrument(skip(catalog, names))]
    pub async fn prefetch<C>(catalog: &C, names: impl IntoIterator<Item = String>) -> Self
    where
        C: Catalog + ?Sized,
    {
        let wanted: BTreeSet<String> = names.into_iter().map(|n| n.to_ascii_lowercase()).collect();
        let mut snapshot = Self::new();

        for name in wanted {
            match catalog.get_table(&name).await {
                Ok(Some(mut table)) => {
                    debug!(table = %name, columns = table.columns.len(), "Prefetched table");
                    // keep the name as queried so schema-qualified lookups hit
                    table.name = name.clone();
                    snapshot.insert(table);
                }
                Ok(None) => {
                    debug!(table = %name, "Table not in catalog");
                    snapshot.missing.insert(name);
                }
                Err(err) => {
                    warn!(table = %name, error = %err, "Catalog lookup failed, treating table as unknown");
                    snapshot.missing.insert(name);
                }
            }
        }

        snapshot
    }

    pub fn insert(&mut self, table: TableMetadata) {
        let key = table.name.to_ascii_lowercase();
        self.missing.remove(&key);
        self.tables.insert(key, table);
    }

    /// Names that were requested but not found
    pub fn missing(&self) -> impl Iterator<Item = &str> {
        self.missing.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn table(&self, name: &str) -> Option<&TableMetadata> {
        self.tables.get(&name.to_ascii_lowercase())
    }
}

impl CatalogLookup for CatalogSnapshot {
    fn table_columns(&self, table: &str) -> Option<Vec<(String, DataType)>> {
        self.table(table).map(TableMetadata::column_types)
    }
}

impl CatalogLookup for StaticCatalog {
    fn table_columns(&self, table: &str) -> Option<Vec<(String, DataType)>> {
        self.lookup(table).map(TableMetadata::column_types)
    }
}
