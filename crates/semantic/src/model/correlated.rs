// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! `source AS alias (c1, c2, ...)`

use querymodel_ir::DialectExtensions;
use tracing::debug;

use crate::context::{AliasBinding, DataContext, ResultColumn};
use crate::error::SemanticError;
use crate::model::NodeId;
use crate::recognition::RecognitionContext;
use crate::symbol::{EntryId, SymbolClass, SymbolDefinition};

use super::{CorrelatedSource, RowsSource, RowsSourceKind};

impl CorrelatedSource {
    pub(crate) fn propagate(
        &self,
        node: &RowsSource,
        input: &DataContext,
        rc: &mut RecognitionContext<'_>,
    ) -> DataContext {
        let mut context = self.source.propagate_context(input, rc);

        let alias = rc.symbols().entry(self.alias).clone();
        let binding = AliasBinding::new(alias.name(), alias.is_quoted(), alias.symbol(), node.id());

        match context.extend_with_table_alias(binding, rc.config()) {
            Ok(extended) => {
                context = extended;
                let symbols = rc.symbols_mut();
                symbols.set_definition(alias.symbol(), SymbolDefinition::Entry(self.alias));
                if symbols.classify(alias.symbol(), SymbolClass::TableAlias) {
                    debug!(alias = alias.name(), "Bound table alias");
                }
            }
            Err(existing) => {
                debug!(alias = alias.name(), previous = %existing.source, "Alias already bound in scope");
                rc.report_diagnostic(alias.range(), SemanticError::DuplicateAlias(alias.name().to_string()));
                rc.symbols_mut().classify(alias.symbol(), SymbolClass::Error);
            }
        }

        if !self.columns.is_empty() && matches!(self.source.kind(), RowsSourceKind::Table(_)) {
            let dialect = rc.config().dialect;
            if !dialect.supports(DialectExtensions::TableColumnAliases) {
                rc.report_diagnostic(
                    alias.range(),
                    SemanticError::Unsupported {
                        feature: "column aliases on a base table".to_string(),
                        dialect: dialect.name().to_string(),
                    },
                );
            }
        }

        prepare_columns_correlation(context, &self.columns, node.id(), true, rc)
    }
}

/// Rename the leading columns of the current tuple after `names`
///
/// The i-th name derives a new column from the i-th column: the name's symbol
/// becomes `ColumnDerived`, defined by the name entry, and the entry records
/// the original column's symbol as its provenance. Columns past the end of
/// `names` pass through unchanged. Names classified on an earlier pass are
/// reused as they are, so propagating twice yields the same tuple.
///
/// Names past the end of the tuple are classified `Error` and, when
/// `report_excess` is set, reported as one correlation count mismatch.
pub(crate) fn prepare_columns_correlation(
    context: DataContext,
    names: &[EntryId],
    source: NodeId,
    report_excess: bool,
    rc: &mut RecognitionContext<'_>,
) -> DataContext {
    if names.is_empty() {
        return context;
    }

    let mut columns = context.get_columns_list();
    let paired = names.len().min(columns.len());

    for (index, name) in names.iter().take(paired).enumerate() {
        let entry = rc.symbols().entry(*name).clone();
        let original = &columns[index];
        let symbols = rc.symbols_mut();

        if symbols.is_not_classified(*name) {
            symbols.set_definition(entry.symbol(), SymbolDefinition::Entry(*name));
            symbols.set_entry_definition(*name, SymbolDefinition::Symbol(original.symbol));
            symbols.set_data_type(entry.symbol(), original.data_type.clone());
            symbols.classify(entry.symbol(), SymbolClass::ColumnDerived);
            rc.record_stat("correlation.derived");
        } else if symbols.symbol(entry.symbol()).class() != SymbolClass::ColumnDerived {
            continue;
        }

        let data_type = original.data_type.clone();
        columns[index] = ResultColumn::new(entry.symbol(), entry.name(), source).with_data_type(data_type);
    }

    if names.len() > paired {
        let excess = &names[paired..];
        let mut range = rc.symbols().entry(excess[0]).range();
        for name in excess {
            let entry = rc.symbols().entry(*name);
            range = range.cover(entry.range());
            let symbol = entry.symbol();
            rc.symbols_mut().classify(symbol, SymbolClass::Error);
        }
        if report_excess {
            rc.report_diagnostic(
                range,
                SemanticError::CorrelationCountMismatch {
                    names: names.len(),
                    columns: columns.len(),
                },
            );
        }
    }

    context.override_result_tuple(columns)
}
