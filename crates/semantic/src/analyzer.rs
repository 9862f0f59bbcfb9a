// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Semantic Analyzer
//!
//! Runs a propagation pass over a [`QueryModel`].
//!
//! The pass itself is synchronous and reads schema through a
//! [`CatalogLookup`]. [`SemanticAnalyzer::analyze`] is the async entry point:
//! it collects the tables the query reads, prefetches them from the
//! [`Catalog`] into a [`CatalogSnapshot`], then propagates.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use querymodel_catalog::{Catalog, CatalogLookup, CatalogSnapshot};

use crate::builder::QueryModel;
use crate::config::AnalysisConfig;
use crate::context::{DataContext, ResultColumn};
use crate::error::{SemanticError, SemanticResult, Severity};
use crate::model::{NodeId, RowsSource};
use crate::recognition::{Diagnostic, RecognitionContext};

/// Everything one propagation pass produced
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    final_context: DataContext,
    diagnostics: Vec<Diagnostic>,
    stats: BTreeMap<String, usize>,
    outputs: HashMap<NodeId, DataContext>,
}

impl AnalysisOutcome {
    /// Output context of the root row source
    pub fn final_context(&self) -> &DataContext {
        &self.final_context
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Diagnostics at `Error` severity
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn stats(&self) -> &BTreeMap<String, usize> {
        &self.stats
    }

    /// Output context recorded for any row source (or CTE definition)
    pub fn output_context(&self, node: NodeId) -> Option<&DataContext> {
        self.outputs.get(&node)
    }

    /// Row source that produced a result column
    pub fn source_node<'m>(&self, model: &'m QueryModel, column: &ResultColumn) -> Option<&'m RowsSource> {
        model.find_node(column.source)
    }
}

/// Semantic analyzer for SQL query models
///
/// Holds configuration and, for the async entry point, the catalog. An
/// analyzer is stateless between calls and can be shared across tasks.
pub struct SemanticAnalyzer {
    config: AnalysisConfig,
    catalog: Option<Arc<dyn Catalog>>,
}

impl SemanticAnalyzer {
    /// Create an analyzer with no catalog attached
    ///
    /// # Examples
    ///
    /// ```rust
    /// use querymodel_semantic::{AnalysisConfig, SemanticAnalyzer};
    ///
    /// let analyzer = SemanticAnalyzer::new(AnalysisConfig::default());
    /// assert_eq!(analyzer.config().max_depth, 128);
    /// ```
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config, catalog: None }
    }

    /// Attach the catalog used by [`analyze`](Self::analyze)
    pub fn with_catalog(mut self, catalog: Arc<dyn Catalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Build a model from a syntax tree with this analyzer's configuration
    pub fn build<N: querymodel_ir::SyntaxNode>(&self, root: &N) -> QueryModel {
        QueryModel::build_with(root, &self.config)
    }

    /// Run one synchronous propagation pass
    ///
    /// # Arguments
    ///
    /// * `model` - Model to classify; its symbol table is updated in place
    /// * `catalog` - Schema lookup for table references
    /// * `initial` - Context the root row source starts from
    /// * `cancellation` - Optional token polled at every row source
    ///
    /// # Errors
    ///
    /// Returns [`SemanticError::Cancelled`] if the token fired during the
    /// pass. Query problems are not errors here; they are diagnostics on the
    /// outcome.
    #[instrument(skip_all, fields(nodes = model.node_count()))]
    pub fn propagate(
        &self,
        model: &mut QueryModel,
        catalog: &dyn CatalogLookup,
        initial: &DataContext,
        cancellation: Option<&CancellationToken>,
    ) -> SemanticResult<AnalysisOutcome> {
        let (root, symbols) = model.parts_mut();
        let mut rc = RecognitionContext::new(catalog, symbols, &self.config);
        if let Some(token) = cancellation {
            rc = rc.with_cancellation(token);
        }

        let final_context = root.propagate_context(initial, &mut rc);
        let result = rc.finish();
        if result.cancelled {
            return Err(SemanticError::Cancelled);
        }

        debug!(
            columns = final_context.columns().len(),
            diagnostics = result.diagnostics.len(),
            "Propagation finished"
        );
        Ok(AnalysisOutcome {
            final_context,
            diagnostics: result.diagnostics,
            stats: result.stats,
            outputs: result.outputs,
        })
    }

    /// Prefetch the query's tables from the attached catalog, then propagate
    ///
    /// # Errors
    ///
    /// Returns [`SemanticError::Catalog`] if no catalog is attached.
    /// Individual table failures are not errors: those tables are reported as
    /// unknown.
    #[instrument(skip_all)]
    pub async fn analyze(&self, model: &mut QueryModel) -> SemanticResult<AnalysisOutcome> {
        let catalog = self
            .catalog
            .as_ref()
            .ok_or_else(|| SemanticError::Catalog("no catalog attached to analyzer".to_string()))?;

        let tables = model.referenced_tables();
        info!(tables = tables.len(), "Analyzing query");
        let snapshot = CatalogSnapshot::prefetch(catalog.as_ref(), tables).await;

        self.propagate(model, &snapshot, &DataContext::empty(), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use querymodel_catalog::{ColumnMetadata, DataType, StaticCatalog, TableMetadata};
    use querymodel_ir::TextRange;

    use crate::model::{ProjectionSource, RowsSourceKind, SelectItem, TableSource};
    use crate::symbol::{SymbolClass, SymbolTable};

    // SELECT * FROM <table>, built by hand
    fn select_star_from(table: &str) -> QueryModel {
        let mut symbols = SymbolTable::new();
        let range = TextRange::new(14, 14 + table.len());
        let entry = symbols.new_entry(range, table);
        let from = RowsSource::new(
            NodeId::new(1),
            range,
            RowsSourceKind::Table(TableSource {
                table: entry,
                implicit_alias: true,
            }),
        );
        let root = RowsSource::new(
            NodeId::new(0),
            TextRange::new(0, range.end),
            RowsSourceKind::Projection(ProjectionSource {
                from: Some(Box::new(from)),
                items: vec![SelectItem::Wildcard {
                    range: TextRange::new(7, 8),
                    qualifier: None,
                }],
                filter: None,
            }),
        );
        QueryModel::from_parts(root, symbols, 2)
    }

    fn catalog() -> StaticCatalog {
        StaticCatalog::from_tables(vec![TableMetadata::new("users", "public").with_columns(vec![
            ColumnMetadata::new("id", DataType::Integer),
            ColumnMetadata::new("email", DataType::Text),
        ])])
    }

    #[test]
    fn test_propagate_select_star() {
        let analyzer = SemanticAnalyzer::new(AnalysisConfig::default());
        let mut model = select_star_from("users");

        let outcome = analyzer
            .propagate(&mut model, &catalog(), &DataContext::empty(), None)
            .unwrap();

        let names: Vec<&str> = outcome
            .final_context()
            .columns()
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["id", "email"]);
        assert!(outcome.diagnostics().is_empty());
        assert_eq!(outcome.stats().get("catalog.hit"), Some(&1));

        let table_entry = model.symbols().entry_at(15).unwrap();
        assert_eq!(model.symbols().entry_symbol(table_entry).class(), SymbolClass::TableName);
    }

    #[test]
    fn test_propagate_unknown_table() {
        let analyzer = SemanticAnalyzer::new(AnalysisConfig::default());
        let mut model = select_star_from("ghosts");

        let outcome = analyzer
            .propagate(&mut model, &catalog(), &DataContext::empty(), None)
            .unwrap();

        assert!(outcome.has_errors());
        assert!(outcome.final_context().columns().is_empty());
        assert!(matches!(
            outcome.diagnostics()[0].error,
            SemanticError::UnknownTable(ref name) if name == "ghosts"
        ));
    }

    #[test]
    fn test_propagate_cancelled() {
        let analyzer = SemanticAnalyzer::new(AnalysisConfig::default());
        let mut model = select_star_from("users");
        let token = CancellationToken::new();
        token.cancel();

        let result = analyzer.propagate(&mut model, &catalog(), &DataContext::empty(), Some(&token));
        assert_eq!(result.unwrap_err(), SemanticError::Cancelled);
    }

    #[tokio::test]
    async fn test_analyze_requires_catalog() {
        let analyzer = SemanticAnalyzer::new(AnalysisConfig::default());
        let mut model = select_star_from("users");
        assert!(matches!(
            analyzer.analyze(&mut model).await,
            Err(SemanticError::Catalog(_))
        ));
    }

    #[tokio::test]
    async fn test_analyze_prefetches() {
        let analyzer = SemanticAnalyzer::new(AnalysisConfig::default()).with_catalog(Arc::new(catalog()));
        let mut model = select_star_from("users");

        let outcome = analyzer.analyze(&mut model).await.unwrap();
        assert_eq!(outcome.final_context().columns().len(), 2);

        let column = &outcome.final_context().columns()[0];
        let source = outcome.source_node(&model, column).unwrap();
        assert_eq!(source.kind_name(), "table");
    }
}
