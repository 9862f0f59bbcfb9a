// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Testing utilities for the query model
//!
//! This crate provides common testing components including:
//! - Mock catalog implementations
//! - Syntax tree builders standing in for a SQL parser
//! - Schema and configuration fixtures

pub mod fixtures;
pub mod mock_catalog;
pub mod mock_syntax;

// Re-exports for convenience
pub use fixtures::SchemaFixtures;
pub use mock_catalog::{Gate, MockCatalog, MockCatalogBuilder};
pub use mock_syntax::{MockSyntaxNode, SqlTreeBuilder};
