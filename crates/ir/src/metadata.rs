// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Catalog metadata
//!
//! Table and column descriptions as reported by a catalog. The semantic
//! layer only consumes ordered `(name, type)` pairs; the remaining fields
//! are carried for catalogs that load richer schema files.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Column type, unified across dialects
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum DataType {
    SmallInt,
    Integer,
    BigInt,
    Decimal,
    Double,
    Boolean,
    Char(Option<usize>),
    Varchar(Option<usize>),
    Text,
    Date,
    Time,
    Timestamp,
    Json,
    Uuid,
    Blob,
    Array(Box<DataType>),
    /// Dialect-specific type, kept by its declared name
    Other(String),
}

impl DataType {
    fn keyword(&self) -> &str {
        match self {
            DataType::SmallInt => "SMALLINT",
            DataType::Integer => "INTEGER",
            DataType::BigInt => "BIGINT",
            DataType::Decimal => "DECIMAL",
            DataType::Double => "DOUBLE",
            DataType::Boolean => "BOOLEAN",
            DataType::Char(_) => "CHAR",
            DataType::Varchar(_) => "VARCHAR",
            DataType::Text => "TEXT",
            DataType::Date => "DATE",
            DataType::Time => "TIME",
            DataType::Timestamp => "TIMESTAMP",
            DataType::Json => "JSON",
            DataType::Uuid => "UUID",
            DataType::Blob => "BLOB",
            DataType::Array(_) => "ARRAY",
            DataType::Other(name) => name,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Char(Some(len)) | DataType::Varchar(Some(len)) => {
                write!(f, "{}({})", self.keyword(), len)
            }
            DataType::Array(inner) => write!(f, "{}[]", inner),
            other => f.write_str(other.keyword()),
        }
    }
}

/// What kind of relation a catalog entry is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TableType {
    #[default]
    Table,
    View,
    MaterializedView,
    Temporary,
}

/// Target of a foreign key column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKey {
    pub table: String,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
    pub is_primary_key: bool,
    /// SQL text of the default expression
    pub default: Option<String>,
    pub comment: Option<String>,
    pub references: Option<ForeignKey>,
}

impl ColumnMetadata {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: false,
            is_primary_key: false,
            default: None,
            comment: None,
            references: None,
        }
    }

    pub fn with_nullable(self, nullable: bool) -> Self {
        Self { nullable, ..self }
    }

    pub fn with_primary_key(self) -> Self {
        Self {
            is_primary_key: true,
            ..self
        }
    }

    pub fn with_default(self, expr: impl Into<String>) -> Self {
        Self {
            default: Some(expr.into()),
            ..self
        }
    }

    pub fn with_comment(self, comment: impl Into<String>) -> Self {
        Self {
            comment: Some(comment.into()),
            ..self
        }
    }

    pub fn with_foreign_key(self, table: impl Into<String>, column: impl Into<String>) -> Self {
        let references = Some(ForeignKey {
            table: table.into(),
            column: column.into(),
        });
        Self { references, ..self }
    }

    pub fn is_foreign_key(&self) -> bool {
        self.references.is_some()
    }
}

/// A table or view as the catalog describes it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMetadata {
    pub name: String,
    pub schema: String,
    pub table_type: TableType,
    /// Declaration order is the order columns are exposed in
    pub columns: Vec<ColumnMetadata>,
    pub row_count_estimate: Option<u64>,
    pub comment: Option<String>,
}

impl TableMetadata {
    pub fn new(name: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
            table_type: TableType::default(),
            columns: Vec::new(),
            row_count_estimate: None,
            comment: None,
        }
    }

    pub fn with_columns(self, columns: Vec<ColumnMetadata>) -> Self {
        Self { columns, ..self }
    }

    pub fn with_type(self, table_type: TableType) -> Self {
        Self { table_type, ..self }
    }

    pub fn with_row_count(self, estimate: u64) -> Self {
        Self {
            row_count_estimate: Some(estimate),
            ..self
        }
    }

    pub fn with_comment(self, comment: impl Into<String>) -> Self {
        Self {
            comment: Some(comment.into()),
            ..self
        }
    }

    /// Exact-name column lookup
    pub fn get_column(&self, name: &str) -> Option<&ColumnMetadata> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Ordered `(name, type)` pairs, the shape consumed by the semantic layer
    pub fn column_types(&self) -> Vec<(String, DataType)> {
        self.columns
            .iter()
            .map(|c| (c.name.clone(), c.data_type.clone()))
            .collect()
    }
}
