// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

use tracing::debug;

use crate::context::{DataContext, ResultColumn};
use crate::error::SemanticError;
use crate::recognition::RecognitionContext;

use super::{RowsSource, SetOperationSource};

impl SetOperationSource {
    pub(crate) fn propagate(
        &self,
        node: &RowsSource,
        input: &DataContext,
        rc: &mut RecognitionContext<'_>,
    ) -> DataContext {
        self.propagate_with_anchor(node, input, rc, |_, _| input.clone())
    }

    /// Propagate the first operand against `input`, then the rest against
    /// whatever `rest_input` derives from the first operand's output
    ///
    /// Recursive CTEs use this to bring the CTE into scope, shaped like its
    /// anchor, before the recursive operands are analyzed.
    pub(crate) fn propagate_with_anchor<'r>(
        &self,
        node: &RowsSource,
        input: &DataContext,
        rc: &mut RecognitionContext<'r>,
        rest_input: impl FnOnce(&DataContext, &mut RecognitionContext<'r>) -> DataContext,
    ) -> DataContext {
        let Some((first, rest)) = self.operands.split_first() else {
            rc.report_diagnostic(
                node.range(),
                SemanticError::MalformedTree("set operation without operands".to_string()),
            );
            return input.override_result_tuple(Vec::new());
        };

        let anchor = first.propagate_context(input, rc);
        let rest_context = rest_input(&anchor, rc);
        let results: Vec<DataContext> = rest
            .iter()
            .map(|operand| operand.propagate_context(&rest_context, rc))
            .collect();

        let expected = anchor.columns().len();
        for (position, (operand, result)) in rest.iter().zip(&results).enumerate() {
            let found = result.columns().len();
            if found != expected {
                rc.report_diagnostic(
                    operand.range(),
                    SemanticError::ShapeMismatch {
                        expected,
                        found,
                        operand: position + 2,
                    },
                );
            }
        }

        // first operand decides names and width
        let columns: Vec<ResultColumn> = anchor
            .columns()
            .iter()
            .enumerate()
            .map(|(index, column)| {
                let mut data_type = column.data_type.clone();
                for result in &results {
                    let other = result.columns().get(index).and_then(|c| c.data_type.as_ref());
                    if let (Some(current), Some(other)) = (&data_type, other) {
                        if current != other {
                            debug!(column = %column.name, "Set operation operands disagree on type");
                            rc.record_stat("set_operation.type_conflict");
                            data_type = None;
                        }
                    }
                }
                ResultColumn::new(column.symbol, column.name.clone(), node.id()).with_data_type(data_type)
            })
            .collect();

        input.override_result_tuple(columns)
    }
}
