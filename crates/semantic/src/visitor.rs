// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Row-source visitors
//!
//! [`RowsSourceVisitor`] has one method per row-source variant and no default
//! implementations, so every visitor handles every variant. A visitor takes an
//! argument of type `A` and returns `R`; [`RowsSource::apply`] dispatches.
//!
//! Two visitors are provided:
//! - [`TableNameCollector`] gathers the catalog tables a query reads, which is
//!   what catalog prefetching needs.
//! - [`NodeFinder`] finds the innermost row source at a byte offset.

use crate::model::{
    CorrelatedSource, CteReference, InvalidSource, JoinSource, NodeId, ProjectionSource, RowsSource,
    RowsSourceKind, SetOperationSource, SubquerySource, TableSource, ValuesSource, WithQuery,
};
use crate::symbol::SymbolTable;

pub trait RowsSourceVisitor<A, R> {
    fn visit_table(&mut self, node: &RowsSource, table: &TableSource, arg: A) -> R;
    fn visit_cte_reference(&mut self, node: &RowsSource, reference: &CteReference, arg: A) -> R;
    fn visit_correlated(&mut self, node: &RowsSource, correlated: &CorrelatedSource, arg: A) -> R;
    fn visit_join(&mut self, node: &RowsSource, join: &JoinSource, arg: A) -> R;
    fn visit_set_operation(&mut self, node: &RowsSource, operation: &SetOperationSource, arg: A) -> R;
    fn visit_subquery(&mut self, node: &RowsSource, subquery: &SubquerySource, arg: A) -> R;
    fn visit_values(&mut self, node: &RowsSource, values: &ValuesSource, arg: A) -> R;
    fn visit_projection(&mut self, node: &RowsSource, projection: &ProjectionSource, arg: A) -> R;
    fn visit_with(&mut self, node: &RowsSource, with: &WithQuery, arg: A) -> R;
    fn visit_invalid(&mut self, node: &RowsSource, invalid: &InvalidSource, arg: A) -> R;
}

impl RowsSource {
    /// Dispatch to the visitor method for this node's variant
    pub fn apply<A, R, V>(&self, visitor: &mut V, arg: A) -> R
    where
        V: RowsSourceVisitor<A, R> + ?Sized,
    {
        match self.kind() {
            RowsSourceKind::Table(t) => visitor.visit_table(self, t, arg),
            RowsSourceKind::CteReference(c) => visitor.visit_cte_reference(self, c, arg),
            RowsSourceKind::Correlated(c) => visitor.visit_correlated(self, c, arg),
            RowsSourceKind::Join(j) => visitor.visit_join(self, j, arg),
            RowsSourceKind::SetOperation(s) => visitor.visit_set_operation(self, s, arg),
            RowsSourceKind::Subquery(s) => visitor.visit_subquery(self, s, arg),
            RowsSourceKind::Values(v) => visitor.visit_values(self, v, arg),
            RowsSourceKind::Projection(p) => visitor.visit_projection(self, p, arg),
            RowsSourceKind::With(w) => visitor.visit_with(self, w, arg),
            RowsSourceKind::Invalid(i) => visitor.visit_invalid(self, i, arg),
        }
    }
}

/// Collects the names of every catalog table a query reads
///
/// CTE references are not tables and are skipped. Names come out in order of
/// first appearance, without duplicates.
pub struct TableNameCollector<'a> {
    symbols: &'a SymbolTable,
    names: Vec<String>,
}

impl<'a> TableNameCollector<'a> {
    pub fn new(symbols: &'a SymbolTable) -> Self {
        Self {
            symbols,
            names: Vec::new(),
        }
    }

    pub fn collect(mut self, root: &RowsSource) -> Vec<String> {
        root.apply(&mut self, ());
        self.names
    }

    fn descend(&mut self, node: &RowsSource) {
        for child in node.children() {
            child.apply(self, ());
        }
    }
}

impl RowsSourceVisitor<(), ()> for TableNameCollector<'_> {
    fn visit_table(&mut self, _node: &RowsSource, table: &TableSource, _: ()) {
        let name = self.symbols.entry(table.table).name();
        if !self.names.iter().any(|n| n.eq_ignore_ascii_case(name)) {
            self.names.push(name.to_string());
        }
    }

    fn visit_cte_reference(&mut self, _node: &RowsSource, _reference: &CteReference, _: ()) {}

    fn visit_correlated(&mut self, node: &RowsSource, _correlated: &CorrelatedSource, _: ()) {
        self.descend(node);
    }

    fn visit_join(&mut self, node: &RowsSource, _join: &JoinSource, _: ()) {
        self.descend(node);
    }

    fn visit_set_operation(&mut self, node: &RowsSource, _operation: &SetOperationSource, _: ()) {
        self.descend(node);
    }

    fn visit_subquery(&mut self, node: &RowsSource, _subquery: &SubquerySource, _: ()) {
        self.descend(node);
    }

    fn visit_values(&mut self, node: &RowsSource, _values: &ValuesSource, _: ()) {
        self.descend(node);
    }

    fn visit_projection(&mut self, node: &RowsSource, _projection: &ProjectionSource, _: ()) {
        self.descend(node);
    }

    fn visit_with(&mut self, node: &RowsSource, _with: &WithQuery, _: ()) {
        self.descend(node);
    }

    fn visit_invalid(&mut self, _node: &RowsSource, _invalid: &InvalidSource, _: ()) {}
}

/// Finds the innermost row source whose range contains an offset
#[derive(Debug, Default)]
pub struct NodeFinder;

impl NodeFinder {
    pub fn find(root: &RowsSource, offset: usize) -> Option<NodeId> {
        root.apply(&mut NodeFinder, offset)
    }

    fn descend(&mut self, node: &RowsSource, offset: usize) -> Option<NodeId> {
        if !node.range().contains(offset) {
            return None;
        }
        node.children()
            .into_iter()
            .find_map(|child| child.apply(self, offset))
            .or(Some(node.id()))
    }
}

impl RowsSourceVisitor<usize, Option<NodeId>> for NodeFinder {
    fn visit_table(&mut self, node: &RowsSource, _table: &TableSource, offset: usize) -> Option<NodeId> {
        self.descend(node, offset)
    }

    fn visit_cte_reference(&mut self, node: &RowsSource, _reference: &CteReference, offset: usize) -> Option<NodeId> {
        self.descend(node, offset)
    }

    fn visit_correlated(&mut self, node: &RowsSource, _correlated: &CorrelatedSource, offset: usize) -> Option<NodeId> {
        self.descend(node, offset)
    }

    fn visit_join(&mut self, node: &RowsSource, _join: &JoinSource, offset: usize) -> Option<NodeId> {
        self.descend(node, offset)
    }

    fn visit_set_operation(
        &mut self,
        node: &RowsSource,
        _operation: &SetOperationSource,
        offset: usize,
    ) -> Option<NodeId> {
        self.descend(node, offset)
    }

    fn visit_subquery(&mut self, node: &RowsSource, _subquery: &SubquerySource, offset: usize) -> Option<NodeId> {
        self.descend(node, offset)
    }

    fn visit_values(&mut self, node: &RowsSource, _values: &ValuesSource, offset: usize) -> Option<NodeId> {
        self.descend(node, offset)
    }

    fn visit_projection(&mut self, node: &RowsSource, _projection: &ProjectionSource, offset: usize) -> Option<NodeId> {
        self.descend(node, offset)
    }

    fn visit_with(&mut self, node: &RowsSource, _with: &WithQuery, offset: usize) -> Option<NodeId> {
        self.descend(node, offset)
    }

    // an invalid node has no children worth entering
    fn visit_invalid(&mut self, node: &RowsSource, _invalid: &InvalidSource, offset: usize) -> Option<NodeId> {
        node.range().contains(offset).then(|| node.id())
    }
}
