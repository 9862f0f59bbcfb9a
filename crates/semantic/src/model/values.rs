// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

use crate::context::{DataContext, ResultColumn};
use crate::error::SemanticError;
use crate::recognition::RecognitionContext;
use crate::symbol::{SymbolClass, SymbolDefinition};

use super::{RowsSource, ValuesSource};

impl ValuesSource {
    /// `VALUES (..), (..)` produces `column1 .. columnN`, N taken from the
    /// first row and types from its literals
    pub(crate) fn propagate(
        &self,
        node: &RowsSource,
        input: &DataContext,
        rc: &mut RecognitionContext<'_>,
    ) -> DataContext {
        let arity = self.rows.first().map_or(0, |row| row.values.len());
        let mut first_row_types = Vec::with_capacity(arity);

        for (index, row) in self.rows.iter().enumerate() {
            let types: Vec<_> = row
                .values
                .iter()
                .map(|value| value.resolve(input, rc).data_type)
                .collect();
            if index == 0 {
                first_row_types = types;
            } else if row.values.len() != arity {
                rc.report_diagnostic(
                    row.range,
                    SemanticError::ShapeMismatch {
                        expected: arity,
                        found: row.values.len(),
                        operand: index + 1,
                    },
                );
            }
        }

        let symbols = rc.symbols_mut();
        let columns = first_row_types
            .into_iter()
            .enumerate()
            .map(|(index, data_type)| {
                let name = format!("column{}", index + 1);
                let symbol = symbols.intern_column(node.id(), index, &name);
                symbols.classify(symbol, SymbolClass::ColumnDerived);
                symbols.set_definition(symbol, SymbolDefinition::Source(node.id()));
                symbols.set_data_type(symbol, data_type.clone());
                ResultColumn::new(symbol, name, node.id()).with_data_type(data_type)
            })
            .collect();

        input.override_result_tuple(columns)
    }
}
