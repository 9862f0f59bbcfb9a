// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! `WITH name (columns) AS (query), ... body` and references to its CTEs

use std::sync::Arc;

use tracing::debug;

use crate::context::{CteBinding, DataContext, ResultColumn};
use crate::error::SemanticError;
use crate::recognition::RecognitionContext;
use crate::symbol::{SymbolClass, SymbolDefinition};

use super::table::bind_implicit_alias;
use super::{prepare_columns_correlation, CteDefinition, CteReference, RowsSource, RowsSourceKind, WithQuery};

impl WithQuery {
    /// CTEs are bound in order, each seeing the ones before it; the body
    /// sees all of them
    pub(crate) fn propagate(
        &self,
        _node: &RowsSource,
        input: &DataContext,
        rc: &mut RecognitionContext<'_>,
    ) -> DataContext {
        let config = rc.config();
        let mut scope = input.clone();
        let mut declared: Vec<(String, bool)> = Vec::new();

        for cte in &self.ctes {
            let entry = rc.symbols().entry(cte.name).clone();
            let duplicate = declared
                .iter()
                .any(|(name, quoted)| config.names_match(name, *quoted, entry.name(), entry.is_quoted()));

            let binding = cte.propagate(&scope, self.recursive, rc);
            if duplicate {
                rc.report_diagnostic(entry.range(), SemanticError::DuplicateAlias(entry.name().to_string()));
                rc.symbols_mut().classify(entry.symbol(), SymbolClass::Error);
                continue;
            }

            let symbols = rc.symbols_mut();
            symbols.set_definition(entry.symbol(), SymbolDefinition::Entry(cte.name));
            symbols.classify(entry.symbol(), SymbolClass::TableName);
            declared.push((entry.name().to_string(), entry.is_quoted()));
            scope = scope.with_cte(binding);
        }

        self.body.propagate_context(&scope, rc)
    }
}

impl CteDefinition {
    fn binding(&self, columns: Vec<ResultColumn>, rc: &RecognitionContext<'_>) -> CteBinding {
        let entry = rc.symbols().entry(self.name);
        CteBinding {
            name: entry.name().to_string(),
            quoted: entry.is_quoted(),
            symbol: entry.symbol(),
            source: self.id,
            columns: Arc::new(columns),
        }
    }

    /// Analyze the CTE query and shape its binding
    ///
    /// In a recursive WITH whose query is a set operation, the first operand
    /// is the anchor: the CTE is in scope, shaped like the anchor, while the
    /// remaining operands are analyzed.
    fn propagate(&self, scope: &DataContext, recursive: bool, rc: &mut RecognitionContext<'_>) -> CteBinding {
        let query_input = scope.nested_scope();

        let result = match self.query.kind() {
            RowsSourceKind::SetOperation(operation) if recursive => {
                self.query.track(&query_input, rc, |rc| {
                    operation.propagate_with_anchor(&self.query, &query_input, rc, |anchor, rc| {
                        debug!(cte = %self.id, "Binding recursive CTE from its anchor");
                        let shaped = prepare_columns_correlation(anchor.clone(), &self.columns, self.id, false, rc);
                        let provisional = self.binding(shaped.get_columns_list(), rc);
                        query_input.with_cte(provisional)
                    })
                })
            }
            _ => self.query.propagate_context(&query_input, rc),
        };

        let shaped = prepare_columns_correlation(result, &self.columns, self.id, true, rc);
        rc.record_output(self.id, shaped.clone());
        self.binding(shaped.get_columns_list(), rc)
    }
}

impl CteReference {
    pub(crate) fn propagate(
        &self,
        node: &RowsSource,
        input: &DataContext,
        rc: &mut RecognitionContext<'_>,
    ) -> DataContext {
        let entry = rc.symbols().entry(self.name).clone();

        let columns = match input.find_cte(entry.name(), entry.is_quoted(), rc.config()) {
            Some(binding) => {
                let columns: Vec<ResultColumn> = binding
                    .columns
                    .iter()
                    .map(|c| ResultColumn {
                        source: node.id(),
                        ..c.clone()
                    })
                    .collect();
                let symbol = binding.symbol;
                rc.symbols_mut().bind_entry(self.name, symbol);
                rc.record_stat("cte.reference");
                columns
            }
            None => {
                rc.report_diagnostic(entry.range(), SemanticError::UnknownTable(entry.name().to_string()));
                rc.symbols_mut().classify(entry.symbol(), SymbolClass::Error);
                Vec::new()
            }
        };

        let output = input.override_result_tuple(columns);
        if self.implicit_alias {
            bind_implicit_alias(output, self.name, node, rc).unwrap_or_else(|unchanged| unchanged)
        } else {
            output
        }
    }
}
