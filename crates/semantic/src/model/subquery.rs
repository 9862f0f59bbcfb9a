// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

use crate::context::DataContext;
use crate::recognition::RecognitionContext;

use super::{RowsSource, SubquerySource};

impl SubquerySource {
    /// The inner query runs in a nested scope; only its tuple comes back out
    pub(crate) fn propagate(
        &self,
        _node: &RowsSource,
        input: &DataContext,
        rc: &mut RecognitionContext<'_>,
    ) -> DataContext {
        let inner = self.query.propagate_context(&input.nested_scope(), rc);
        input.override_result_tuple(inner.get_columns_list())
    }
}
