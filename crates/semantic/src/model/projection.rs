// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

use crate::context::{DataContext, ResultColumn};
use crate::recognition::RecognitionContext;
use crate::symbol::{EntryId, SymbolClass, SymbolDefinition};

use super::expr::{resolve_qualifier, ExprInfo};
use super::{ProjectionSource, RowsSource, SelectItem, ValueExpr};

/// Name of a select item with no alias and no column of its own
const ANONYMOUS_COLUMN: &str = "?column?";

impl ProjectionSource {
    /// FROM first, then WHERE and the select list against the FROM output
    pub(crate) fn propagate(
        &self,
        node: &RowsSource,
        input: &DataContext,
        rc: &mut RecognitionContext<'_>,
    ) -> DataContext {
        let from = match &self.from {
            Some(from) => from.propagate_context(input, rc),
            None => input.override_result_tuple(Vec::new()),
        };

        if let Some(filter) = &self.filter {
            filter.resolve(&from, rc);
        }

        let mut columns = Vec::new();
        for (index, item) in self.items.iter().enumerate() {
            match item {
                SelectItem::Wildcard { qualifier: None, .. } => {
                    columns.extend(from.columns().iter().cloned());
                }
                SelectItem::Wildcard {
                    qualifier: Some(qualifier),
                    ..
                } => {
                    if let Some(expanded) = resolve_qualifier(*qualifier, &from, rc) {
                        columns.extend(expanded);
                    }
                }
                SelectItem::Expr { expr, alias, .. } => {
                    let info = expr.resolve(&from, rc);
                    let column = match alias {
                        Some(alias) => derive_aliased(*alias, info, node, rc),
                        None => match info.column {
                            Some(column) => column,
                            None => derive_anonymous(expr, index, info, node, rc),
                        },
                    };
                    columns.push(column);
                }
            }
        }

        from.override_result_tuple(columns)
    }
}

/// `expr AS alias`
fn derive_aliased(
    alias: EntryId,
    info: ExprInfo,
    node: &RowsSource,
    rc: &mut RecognitionContext<'_>,
) -> ResultColumn {
    let entry = rc.symbols().entry(alias).clone();
    let symbols = rc.symbols_mut();
    if symbols.is_not_classified(alias) {
        symbols.set_definition(entry.symbol(), SymbolDefinition::Entry(alias));
        if let Some(column) = &info.column {
            symbols.set_entry_definition(alias, SymbolDefinition::Symbol(column.symbol));
        }
        symbols.set_data_type(entry.symbol(), info.data_type.clone());
        symbols.classify(entry.symbol(), SymbolClass::ColumnDerived);
    }
    ResultColumn::new(entry.symbol(), entry.name(), node.id()).with_data_type(info.data_type)
}

/// Unaliased expression; an unresolved column reference keeps its name
fn derive_anonymous(
    expr: &ValueExpr,
    index: usize,
    info: ExprInfo,
    node: &RowsSource,
    rc: &mut RecognitionContext<'_>,
) -> ResultColumn {
    let name = match expr {
        ValueExpr::Column { name, .. } => rc.symbols().entry(*name).name().to_string(),
        _ => ANONYMOUS_COLUMN.to_string(),
    };
    let symbols = rc.symbols_mut();
    let symbol = symbols.intern_column(node.id(), index, &name);
    symbols.set_definition(symbol, SymbolDefinition::Source(node.id()));
    symbols.set_data_type(symbol, info.data_type.clone());
    symbols.classify(symbol, SymbolClass::ColumnDerived);
    ResultColumn::new(symbol, name, node.id()).with_data_type(info.data_type)
}
