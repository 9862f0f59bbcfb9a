// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Metadata types for database schema information
//!
//! Re-exports of the schema metadata defined in `querymodel-ir`, so catalog
//! implementors only need this crate.

pub use querymodel_ir::{ColumnMetadata, DataType, ForeignKey, TableMetadata, TableType};
