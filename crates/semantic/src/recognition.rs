// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Per-pass recognition state
//!
//! A [`RecognitionContext`] is created for one propagation pass and passed by
//! mutable reference down the row-source tree. It carries the collaborators
//! (catalog lookup, configuration, cancellation token), the symbol table the
//! pass classifies into, and the diagnostics and statistics it accumulates.

use std::collections::{BTreeMap, HashMap};

use querymodel_catalog::CatalogLookup;
use querymodel_ir::TextRange;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::AnalysisConfig;
use crate::context::DataContext;
use crate::error::{DiagnosticKind, SemanticError, Severity};
use crate::model::NodeId;
use crate::symbol::SymbolTable;

/// A problem found in the query, tied to a range of its text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub code: &'static str,
    pub severity: Severity,
    pub range: TextRange,
    pub message: String,
    pub error: SemanticError,
}

impl Diagnostic {
    pub fn new(range: TextRange, error: SemanticError) -> Self {
        let kind = error.kind();
        Self {
            kind,
            code: kind.code(),
            severity: error.severity(),
            range,
            message: error.to_string(),
            error,
        }
    }
}

pub struct RecognitionContext<'a> {
    catalog: &'a dyn CatalogLookup,
    symbols: &'a mut SymbolTable,
    config: &'a AnalysisConfig,
    cancellation: Option<&'a CancellationToken>,
    cancelled: bool,
    depth: usize,
    diagnostics: Vec<Diagnostic>,
    stats: BTreeMap<String, usize>,
    outputs: HashMap<NodeId, DataContext>,
}

impl<'a> RecognitionContext<'a> {
    pub fn new(
        catalog: &'a dyn CatalogLookup,
        symbols: &'a mut SymbolTable,
        config: &'a AnalysisConfig,
    ) -> Self {
        Self {
            catalog,
            symbols,
            config,
            cancellation: None,
            cancelled: false,
            depth: 0,
            diagnostics: Vec::new(),
            stats: BTreeMap::new(),
            outputs: HashMap::new(),
        }
    }

    pub fn with_cancellation(mut self, token: &'a CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn catalog(&self) -> &'a dyn CatalogLookup {
        self.catalog
    }

    pub fn config(&self) -> &'a AnalysisConfig {
        self.config
    }

    pub fn symbols(&self) -> &SymbolTable {
        &*self.symbols
    }

    pub(crate) fn symbols_mut(&mut self) -> &mut SymbolTable {
        &mut *self.symbols
    }

    /// Record a diagnostic at the given range
    pub fn report_diagnostic(&mut self, range: TextRange, error: SemanticError) {
        debug!(code = error.kind().code(), start = range.start, end = range.end, "{}", error);
        self.diagnostics.push(Diagnostic::new(range, error));
    }

    /// Increment a named counter
    pub fn record_stat(&mut self, name: &str) {
        *self.stats.entry(name.to_string()).or_insert(0) += 1;
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn stats(&self) -> &BTreeMap<String, usize> {
        &self.stats
    }

    /// Whether the pass should stop
    ///
    /// Once the token fires the answer stays `true` for the rest of the pass.
    pub fn is_cancelled(&mut self) -> bool {
        if !self.cancelled && self.cancellation.is_some_and(CancellationToken::is_cancelled) {
            debug!("Propagation cancelled");
            self.cancelled = true;
        }
        self.cancelled
    }

    /// Enter one nesting level; `false` when the configured limit is reached
    pub(crate) fn enter(&mut self) -> bool {
        if self.depth >= self.config.max_depth {
            return false;
        }
        self.depth += 1;
        true
    }

    pub(crate) fn exit(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub(crate) fn record_output(&mut self, node: NodeId, context: DataContext) {
        self.outputs.insert(node, context);
    }

    /// Output context of a row source already propagated in this pass
    pub fn output_context(&self, node: NodeId) -> Option<&DataContext> {
        self.outputs.get(&node)
    }

    pub(crate) fn finish(self) -> RecognitionResult {
        RecognitionResult {
            diagnostics: self.diagnostics,
            stats: self.stats,
            outputs: self.outputs,
            cancelled: self.cancelled,
        }
    }
}

pub(crate) struct RecognitionResult {
    pub diagnostics: Vec<Diagnostic>,
    pub stats: BTreeMap<String, usize>,
    pub outputs: HashMap<NodeId, DataContext>,
    pub cancelled: bool,
}
