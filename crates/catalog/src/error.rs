// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Error types for Catalog operations

use serde::Serialize;
use thiserror::Error;

/// Result type alias for Catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors that can occur during Catalog operations
#[derive(Debug, Error, Clone, Serialize)]
pub enum CatalogError {
    /// Failed to reach the schema source
    #[error("Failed to connect to schema source: {0}")]
    ConnectionFailed(String),

    /// Metadata query failed
    #[error("Metadata query failed: {0}")]
    QueryFailed(String),

    /// Metadata query timed out
    #[error("Metadata query timed out after {0}s")]
    QueryTimeout(u64),

    /// Requested table was not found
    #[error("Table '{0}' not found in schema '{1}'")]
    TableNotFound(String, String),

    /// Failed to serialize or deserialize schema data
    #[error("Failed to parse schema data: {0}")]
    SerializationError(String),

    /// Permission denied for requested operation
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
}

impl CatalogError {
    /// A missing table is an answer, every other error is a failure of the source
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::TableNotFound(_, _))
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for CatalogError {
    fn from(err: serde_yaml::Error) -> Self {
        CatalogError::SerializationError(err.to_string())
    }
}
