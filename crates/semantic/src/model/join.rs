// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

use querymodel_ir::DialectExtensions;
use tracing::debug;

use crate::context::DataContext;
use crate::error::SemanticError;
use crate::recognition::RecognitionContext;
use crate::symbol::{EntryId, SymbolClass};

use super::{JoinCondition, JoinKind, JoinSource, RowsSource};

impl JoinSource {
    /// Left side first, then the right side
    ///
    /// The right side sees the left side's aliases as hidden: they still
    /// occupy their names, so `a JOIN b AS a` is a duplicate, but cannot be
    /// referenced unless the join is LATERAL. The output tuple is the left
    /// tuple followed by the right tuple, and the condition is resolved
    /// against it.
    pub(crate) fn propagate(
        &self,
        node: &RowsSource,
        input: &DataContext,
        rc: &mut RecognitionContext<'_>,
    ) -> DataContext {
        let left = self.left.propagate_context(input, rc);

        if self.kind == JoinKind::Full {
            let dialect = rc.config().dialect;
            if !dialect.supports(DialectExtensions::FullOuterJoin) {
                rc.report_diagnostic(
                    node.range(),
                    SemanticError::Unsupported {
                        feature: "FULL OUTER JOIN".to_string(),
                        dialect: dialect.name().to_string(),
                    },
                );
            }
        }

        let right_input = if self.lateral {
            let dialect = rc.config().dialect;
            if !dialect.supports(DialectExtensions::LateralJoin) {
                rc.report_diagnostic(
                    node.range(),
                    SemanticError::Unsupported {
                        feature: "LATERAL".to_string(),
                        dialect: dialect.name().to_string(),
                    },
                );
            }
            left.clone()
        } else {
            left.with_hidden_aliases().override_result_tuple(input.get_columns_list())
        };
        let right = self.right.propagate_context(&right_input, rc);

        let mut columns = left.get_columns_list();
        columns.extend(right.columns().iter().cloned());
        let output = right
            .with_aliases_revealed_by(&left)
            .override_result_tuple(columns);

        match &self.condition {
            JoinCondition::None => {}
            JoinCondition::On(expr) => {
                expr.resolve(&output, rc);
            }
            JoinCondition::Using(names) => {
                for name in names {
                    resolve_using_column(*name, &left, &right, rc);
                }
            }
            JoinCondition::Natural => rc.record_stat("join.natural"),
        }

        output
    }
}

/// `USING (c)`: `c` must name exactly one column on each side
fn resolve_using_column(
    name: EntryId,
    left: &DataContext,
    right: &DataContext,
    rc: &mut RecognitionContext<'_>,
) {
    let config = rc.config();
    let entry = rc.symbols().entry(name).clone();

    let left_matches = left.find_local_columns(entry.name(), entry.is_quoted(), config);
    let right_matches = right.find_local_columns(entry.name(), entry.is_quoted(), config);

    match (left_matches.as_slice(), right_matches.as_slice()) {
        ([column], [_]) => {
            let symbol = column.symbol;
            rc.symbols_mut().bind_entry(name, symbol);
        }
        ([], _) | (_, []) => {
            debug!(column = entry.name(), "USING column missing on one side");
            rc.report_diagnostic(entry.range(), SemanticError::UnknownColumn(entry.name().to_string()));
            rc.symbols_mut().classify(entry.symbol(), SymbolClass::Error);
        }
        (l, r) => {
            let sources = l.iter().chain(r.iter()).map(|c| c.source_label()).collect();
            rc.report_diagnostic(
                entry.range(),
                SemanticError::AmbiguousColumn(entry.name().to_string(), sources),
            );
            rc.symbols_mut().classify(entry.symbol(), SymbolClass::Ambiguous);
        }
    }
}
