// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Query Model - Shared Types
//!
//! Value types shared by the catalog and semantic layers:
//! - Unified SQL data types and schema metadata
//! - SQL dialects and their optional extensions
//! - Byte ranges into the analyzed document
//! - The read-only syntax tree interface the model builder consumes

pub mod dialect;
pub mod metadata;
pub mod span;
pub mod syntax;

// Re-export commonly used types
pub use dialect::{Dialect, DialectExtensions, DialectFamily};
pub use metadata::{ColumnMetadata, DataType, ForeignKey, TableMetadata, TableType};
pub use span::TextRange;
pub use syntax::SyntaxNode;
