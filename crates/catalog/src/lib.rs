// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Query Model - Catalog Layer
//!
//! Schema access for semantic analysis. The catalog answers one question:
//! "does table T exist, and which columns (with types) does it have?"
//!
//! ## Architecture
//!
//! - [`Catalog`]: async schema source (live connection, files, caches).
//!   Implemented outside the analysis core.
//! - [`CatalogLookup`]: synchronous lookup consumed by a propagation pass.
//!   A pass never suspends, so the tables it needs are fetched up front.
//! - [`CatalogSnapshot`]: the bridge; prefetches a set of table names from a
//!   [`Catalog`] and serves them synchronously.
//! - [`StaticCatalog`]: in-memory catalog, loadable from YAML or JSON.
//!
//! ## Usage
//!
//! ```rust
//! use querymodel_catalog::{CatalogLookup, CatalogSnapshot, DataType, TableMetadata, ColumnMetadata};
//!
//! let snapshot = CatalogSnapshot::from_tables(vec![
//!     TableMetadata::new("users", "public").with_columns(vec![
//!         ColumnMetadata::new("id", DataType::Integer),
//!         ColumnMetadata::new("name", DataType::Text),
//!     ]),
//! ]);
//!
//! let columns = snapshot.table_columns("users").unwrap();
//! assert_eq!(columns[0], ("id".to_string(), DataType::Integer));
//! assert!(snapshot.table_columns("orders").is_none());
//! ```

pub mod error;
pub mod lookup;
pub mod metadata;
pub mod r#static;
pub mod r#trait;

// Re-exports
pub use error::{CatalogError, CatalogResult};
pub use lookup::{CatalogLookup, CatalogSnapshot};
pub use metadata::{ColumnMetadata, DataType, ForeignKey, TableMetadata, TableType};
pub use r#static::StaticCatalog;
pub use r#trait::Catalog;
