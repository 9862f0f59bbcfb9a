// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

use tracing::debug;

use crate::context::{AliasBinding, DataContext, ResultColumn};
use crate::error::SemanticError;
use crate::recognition::RecognitionContext;
use crate::symbol::{EntryId, SymbolClass, SymbolDefinition};

use super::{RowsSource, TableSource};

impl TableSource {
    pub(crate) fn propagate(
        &self,
        node: &RowsSource,
        input: &DataContext,
        rc: &mut RecognitionContext<'_>,
    ) -> DataContext {
        let entry = rc.symbols().entry(self.table).clone();
        let table_name = entry.name().to_string();

        // a clashing implicit alias downgrades this occurrence before it is classified
        let scope = if self.implicit_alias {
            bind_implicit_alias(input.clone(), self.table, node, rc).unwrap_or_else(|unchanged| {
                rc.symbols_mut().classify(entry.symbol(), SymbolClass::Error);
                unchanged
            })
        } else {
            input.clone()
        };

        let columns = match rc.catalog().table_columns(&table_name) {
            Some(columns) => {
                let symbols = rc.symbols_mut();
                symbols.classify(entry.symbol(), SymbolClass::TableName);
                symbols.set_definition(entry.symbol(), SymbolDefinition::Table(table_name.clone()));

                let columns: Vec<ResultColumn> = columns
                    .into_iter()
                    .enumerate()
                    .map(|(index, (name, data_type))| {
                        let symbol = symbols.intern_column(node.id(), index, &name);
                        symbols.classify(symbol, SymbolClass::Column);
                        symbols.set_definition(
                            symbol,
                            SymbolDefinition::Column {
                                table: table_name.clone(),
                                column: name.clone(),
                            },
                        );
                        symbols.set_data_type(symbol, Some(data_type.clone()));
                        ResultColumn::new(symbol, name.clone(), node.id())
                            .with_origin(table_name.clone(), name)
                            .with_data_type(Some(data_type))
                    })
                    .collect();
                rc.record_stat("catalog.hit");
                columns
            }
            None => {
                debug!(table = %table_name, "Table not found in catalog");
                rc.record_stat("catalog.miss");
                rc.report_diagnostic(entry.range(), SemanticError::UnknownTable(table_name.clone()));
                rc.symbols_mut().classify(entry.symbol(), SymbolClass::Error);
                Vec::new()
            }
        };

        scope.override_result_tuple(columns)
    }
}

/// Bind an unaliased table (or CTE) reference under its own name
///
/// `FROM users` makes `users.id` resolvable. Only the last part of a
/// qualified name is bound, so `public.users` answers to `users`.
///
/// A clash is reported as a duplicate alias and hands back `context`
/// unchanged as the error; the caller decides whether to downgrade the
/// reference. A CTE reference shares the CTE's symbol, so it keeps its class.
pub(super) fn bind_implicit_alias(
    context: DataContext,
    name: EntryId,
    node: &RowsSource,
    rc: &mut RecognitionContext<'_>,
) -> Result<DataContext, DataContext> {
    let entry = rc.symbols().entry(name);
    let alias = match entry.name().rsplit_once('.') {
        Some((_, table)) => table.to_string(),
        None => entry.name().to_string(),
    };
    let binding = AliasBinding::new(alias.clone(), entry.is_quoted(), entry.symbol(), node.id());
    let range = entry.range();

    match context.extend_with_table_alias(binding, rc.config()) {
        Ok(extended) => Ok(extended),
        Err(_) => {
            rc.report_diagnostic(range, SemanticError::DuplicateAlias(alias));
            Err(context)
        }
    }
}
