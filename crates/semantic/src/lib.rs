// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # SQL Query Model - Semantic Layer
//!
//! Figures out what every identifier in a SQL query refers to and what
//! columns each part of the query produces.
//!
//! ## Overview
//!
//! - **Model**: a query is a tree of [`RowsSource`] nodes (tables, aliased
//!   sources, joins, set operations, subqueries, VALUES, SELECT, WITH),
//!   built from a syntax tree by [`QueryModel::build`].
//! - **Symbols**: every identifier occurrence is a [`SymbolEntry`] pointing at
//!   a shared [`Symbol`] that gets classified (table, alias, column, ...).
//! - **Propagation**: each node turns an input [`DataContext`] (columns and
//!   aliases in scope) into an output context, recording [`Diagnostic`]s on
//!   a [`RecognitionContext`].
//!
//! ## Example
//!
//! ```rust
//! use querymodel_catalog::CatalogSnapshot;
//! use querymodel_semantic::{AnalysisConfig, DataContext, QueryModel, SemanticAnalyzer};
//! use querymodel_ir::{SyntaxNode, TextRange};
//!
//! // A parser-independent tree: `users`
//! #[derive(Clone)]
//! struct Leaf(&'static str, &'static str);
//!
//! impl SyntaxNode for Leaf {
//!     fn kind(&self) -> &str { self.0 }
//!     fn range(&self) -> TextRange { TextRange::new(0, self.1.len()) }
//!     fn text(&self) -> Option<&str> { Some(self.1) }
//!     fn children(&self) -> Vec<Self> { Vec::new() }
//! }
//!
//! let mut model = QueryModel::build(&Leaf("table_reference", "users"));
//! let analyzer = SemanticAnalyzer::new(AnalysisConfig::default());
//! let outcome = analyzer
//!     .propagate(&mut model, &CatalogSnapshot::new(), &DataContext::empty(), None)
//!     .unwrap();
//!
//! // the empty catalog does not know `users`
//! assert_eq!(outcome.diagnostics().len(), 1);
//! ```

pub mod analyzer;
pub mod builder;
pub mod config;
pub mod context;
pub mod error;
pub mod model;
pub mod recognition;
pub mod session;
pub mod symbol;
pub mod visitor;

pub use analyzer::{AnalysisOutcome, SemanticAnalyzer};
pub use builder::QueryModel;
pub use config::AnalysisConfig;
pub use context::{AliasBinding, CteBinding, DataContext, ResultColumn};
pub use error::{DiagnosticKind, SemanticError, SemanticResult, Severity};
pub use model::{
    CorrelatedSource, CteDefinition, CteReference, InvalidSource, JoinCondition, JoinKind, JoinSource,
    LiteralKind, NodeId, ProjectionSource, RowsSource, RowsSourceKind, SelectItem, SetOperationSource,
    SetOperator, SubquerySource, TableSource, ValueExpr, ValuesRow, ValuesSource, WithQuery,
};
pub use recognition::{Diagnostic, RecognitionContext};
pub use session::AnalysisSession;
pub use symbol::{EntryId, Symbol, SymbolClass, SymbolDefinition, SymbolEntry, SymbolId, SymbolTable};
pub use visitor::{NodeFinder, RowsSourceVisitor, TableNameCollector};

// Token type taken by `SemanticAnalyzer::propagate`
pub use tokio_util::sync::CancellationToken;
