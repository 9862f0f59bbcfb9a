// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Error types for semantic analysis
//!
//! Most problems found while propagating a query are not fatal: they are
//! recorded as diagnostics against a range of the query and the pass carries
//! on. [`SemanticError`] is used for both, and [`SemanticError::severity`]
//! decides how a diagnostic is rendered.

use serde::Serialize;
use thiserror::Error;

/// Result type alias for semantic operations
pub type SemanticResult<T> = Result<T, SemanticError>;

/// Errors that can occur during semantic analysis
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
pub enum SemanticError {
    /// Qualifier does not name any visible table alias
    #[error("Table alias not found in scope: {0}")]
    UnresolvedAlias(String),

    /// Duplicate table alias (or CTE name) in the same scope
    #[error("Duplicate table alias: {0}")]
    DuplicateAlias(String),

    /// Correlation list names more columns than the source produces
    #[error("Correlation list names {names} columns but the source has only {columns} columns")]
    CorrelationCountMismatch { names: usize, columns: usize },

    /// Column not found in any visible row source
    #[error("Column not found: {0}")]
    UnknownColumn(String),

    /// Table unknown to the catalog
    #[error("Table not found: {0}")]
    UnknownTable(String),

    /// Column reference is ambiguous (found in multiple sources)
    #[error("Ambiguous column reference: {0} (found in {1:?})")]
    AmbiguousColumn(String, Vec<String>),

    /// Set operation or VALUES operand with a different width
    #[error("Column count mismatch: expected {expected} columns, operand {operand} has {found} columns")]
    ShapeMismatch {
        expected: usize,
        found: usize,
        operand: usize,
    },

    /// Syntax tree is missing a required part
    #[error("Malformed query: {0}")]
    MalformedTree(String),

    /// Nesting deeper than the configured limit
    #[error("Query nesting limit ({limit}) exceeded")]
    RecursionLimit { limit: usize },

    /// Construct the configured dialect does not support
    #[error("{feature} is not supported by {dialect}")]
    Unsupported { feature: String, dialect: String },

    /// The pass was cancelled before it finished
    #[error("Analysis cancelled")]
    Cancelled,

    /// Catalog source failure surfaced by an async entry point
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Invalid analysis configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Background task failure
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Machine-readable diagnostic category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticKind {
    UnresolvedAlias,
    DuplicateAlias,
    CorrelationCountMismatch,
    UnknownColumn,
    UnknownTable,
    AmbiguousColumn,
    ShapeMismatch,
    MalformedTree,
    RecursionLimit,
    Unsupported,
    Internal,
}

impl DiagnosticKind {
    /// Stable diagnostic code
    pub fn code(&self) -> &'static str {
        match self {
            DiagnosticKind::UnresolvedAlias => "QM-001",
            DiagnosticKind::DuplicateAlias => "QM-002",
            DiagnosticKind::CorrelationCountMismatch => "QM-003",
            DiagnosticKind::UnknownColumn => "QM-004",
            DiagnosticKind::UnknownTable => "QM-005",
            DiagnosticKind::AmbiguousColumn => "QM-006",
            DiagnosticKind::ShapeMismatch => "QM-007",
            DiagnosticKind::MalformedTree => "QM-008",
            DiagnosticKind::RecursionLimit => "QM-009",
            DiagnosticKind::Unsupported => "QM-010",
            DiagnosticKind::Internal => "QM-999",
        }
    }
}

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl SemanticError {
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            SemanticError::UnresolvedAlias(_) => DiagnosticKind::UnresolvedAlias,
            SemanticError::DuplicateAlias(_) => DiagnosticKind::DuplicateAlias,
            SemanticError::CorrelationCountMismatch { .. } => DiagnosticKind::CorrelationCountMismatch,
            SemanticError::UnknownColumn(_) => DiagnosticKind::UnknownColumn,
            SemanticError::UnknownTable(_) => DiagnosticKind::UnknownTable,
            SemanticError::AmbiguousColumn(_, _) => DiagnosticKind::AmbiguousColumn,
            SemanticError::ShapeMismatch { .. } => DiagnosticKind::ShapeMismatch,
            SemanticError::MalformedTree(_) => DiagnosticKind::MalformedTree,
            SemanticError::RecursionLimit { .. } => DiagnosticKind::RecursionLimit,
            SemanticError::Unsupported { .. } => DiagnosticKind::Unsupported,
            SemanticError::Cancelled
            | SemanticError::Catalog(_)
            | SemanticError::Config(_)
            | SemanticError::Internal(_) => DiagnosticKind::Internal,
        }
    }

    /// Get the severity of this error
    ///
    /// Warnings still leave a usable tuple behind.
    pub fn severity(&self) -> Severity {
        match self {
            SemanticError::ShapeMismatch { .. }
            | SemanticError::CorrelationCountMismatch { .. }
            | SemanticError::Unsupported { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_unresolved_alias() {
        let err = SemanticError::UnresolvedAlias("u".to_string());
        let msg = format!("{}", err);
        assert!(msg.contains("alias"));
        assert!(msg.contains("u"));
    }

    #[test]
    fn test_error_display_ambiguous_column() {
        let err = SemanticError::AmbiguousColumn(
            "id".to_string(),
            vec!["users".to_string(), "orders".to_string()],
        );
        let msg = format!("{}", err);
        assert!(msg.contains("id"));
        assert!(msg.contains("Ambiguous"));
        assert!(msg.contains("users"));
        assert!(msg.contains("orders"));
    }

    #[test]
    fn test_error_display_correlation_count_mismatch() {
        let err = SemanticError::CorrelationCountMismatch { names: 3, columns: 2 };
        let msg = format!("{}", err);
        assert!(msg.contains("3"));
        assert!(msg.contains("2"));
    }

    #[test]
    fn test_error_display_shape_mismatch() {
        let err = SemanticError::ShapeMismatch {
            expected: 3,
            found: 2,
            operand: 2,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("expected 3"));
        assert!(msg.contains("has 2"));
    }

    #[test]
    fn test_error_display_recursion_limit() {
        let err = SemanticError::RecursionLimit { limit: 128 };
        let msg = format!("{}", err);
        assert!(msg.contains("128"));
        assert!(msg.contains("exceeded"));
    }

    #[test]
    fn test_severity() {
        let shape = SemanticError::ShapeMismatch {
            expected: 1,
            found: 2,
            operand: 2,
        };
        assert_eq!(shape.severity(), Severity::Warning);
        assert_eq!(
            SemanticError::CorrelationCountMismatch { names: 3, columns: 2 }.severity(),
            Severity::Warning
        );
        assert_eq!(
            SemanticError::DuplicateAlias("t".to_string()).severity(),
            Severity::Error
        );
        assert!(Severity::Warning < Severity::Error);
    }

    #[test]
    fn test_kind_codes_are_distinct() {
        let kinds = [
            SemanticError::UnresolvedAlias(String::new()).kind(),
            SemanticError::DuplicateAlias(String::new()).kind(),
            SemanticError::UnknownColumn(String::new()).kind(),
            SemanticError::UnknownTable(String::new()).kind(),
            SemanticError::MalformedTree(String::new()).kind(),
        ];
        let mut codes: Vec<&str> = kinds.iter().map(DiagnosticKind::code).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), kinds.len());
        assert_eq!(SemanticError::Cancelled.kind(), DiagnosticKind::Internal);
    }
}
