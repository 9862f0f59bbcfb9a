// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Row-source model
//!
//! A query is modeled as a tree of [`RowsSource`] nodes. Each node takes an
//! input [`DataContext`] and produces an output context via
//! [`RowsSource::propagate_context`]; on the way it classifies the symbols of
//! the identifiers it owns and reports diagnostics.
//!
//! The set of variants is closed. Dispatch is an exhaustive `match`, so
//! adding a variant fails to compile until both propagation and
//! [`RowsSourceVisitor`](crate::visitor::RowsSourceVisitor) handle it.
//!
//! ## Propagation rules
//!
//! | Variant        | Output                                                   |
//! |----------------|----------------------------------------------------------|
//! | `Table`        | catalog columns of the table                              |
//! | `CteReference` | columns of the CTE in scope                               |
//! | `Correlated`   | source output, alias added, columns optionally renamed    |
//! | `Join`         | left tuple followed by right tuple                        |
//! | `SetOperation` | first operand's tuple                                     |
//! | `Subquery`     | inner tuple, inner aliases dropped                        |
//! | `Values`       | `column1..columnN`                                        |
//! | `Projection`   | select-list items                                         |
//! | `With`         | body output with the CTEs in scope                        |
//! | `Invalid`      | empty tuple                                               |

use std::fmt;

use querymodel_ir::TextRange;
use tracing::trace;

use crate::context::DataContext;
use crate::error::SemanticError;
use crate::recognition::RecognitionContext;
use crate::symbol::EntryId;

mod correlated;
mod cte;
mod expr;
mod join;
mod projection;
mod set_operation;
mod subquery;
mod table;
mod values;

pub(crate) use correlated::prepare_columns_correlation;

/// Identity of a row source within one query model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// A node of the row-source tree
#[derive(Debug, Clone, PartialEq)]
pub struct RowsSource {
    id: NodeId,
    range: TextRange,
    kind: RowsSourceKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowsSourceKind {
    Table(TableSource),
    CteReference(CteReference),
    Correlated(CorrelatedSource),
    Join(JoinSource),
    SetOperation(SetOperationSource),
    Subquery(SubquerySource),
    Values(ValuesSource),
    Projection(ProjectionSource),
    With(WithQuery),
    Invalid(InvalidSource),
}

/// Catalog table reference
#[derive(Debug, Clone, PartialEq)]
pub struct TableSource {
    pub table: EntryId,
    /// Bind the table name as an alias (the reference is not aliased)
    pub implicit_alias: bool,
}

/// Reference to a CTE in scope
#[derive(Debug, Clone, PartialEq)]
pub struct CteReference {
    pub name: EntryId,
    pub implicit_alias: bool,
}

/// `source AS alias (c1, c2, ...)`
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelatedSource {
    pub source: Box<RowsSource>,
    pub alias: EntryId,
    pub columns: Vec<EntryId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JoinCondition {
    None,
    On(ValueExpr),
    Using(Vec<EntryId>),
    Natural,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinSource {
    pub left: Box<RowsSource>,
    pub right: Box<RowsSource>,
    pub kind: JoinKind,
    /// Right side may reference the left side's aliases
    pub lateral: bool,
    pub condition: JoinCondition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperator {
    Union,
    UnionAll,
    Intersect,
    IntersectAll,
    Except,
    ExceptAll,
}

impl SetOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            SetOperator::Union => "UNION",
            SetOperator::UnionAll => "UNION ALL",
            SetOperator::Intersect => "INTERSECT",
            SetOperator::IntersectAll => "INTERSECT ALL",
            SetOperator::Except => "EXCEPT",
            SetOperator::ExceptAll => "EXCEPT ALL",
        }
    }
}

/// `a UNION b EXCEPT c ...`, operands in source order
#[derive(Debug, Clone, PartialEq)]
pub struct SetOperationSource {
    pub operands: Vec<RowsSource>,
    /// `operators[i]` sits between `operands[i]` and `operands[i + 1]`
    pub operators: Vec<SetOperator>,
}

/// Parenthesized query used as a row source
#[derive(Debug, Clone, PartialEq)]
pub struct SubquerySource {
    pub query: Box<RowsSource>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValuesRow {
    pub range: TextRange,
    pub values: Vec<ValueExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValuesSource {
    pub rows: Vec<ValuesRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    /// `*` or `t.*`
    Wildcard {
        range: TextRange,
        qualifier: Option<EntryId>,
    },
    Expr {
        range: TextRange,
        expr: ValueExpr,
        alias: Option<EntryId>,
    },
}

/// `SELECT items FROM from WHERE filter`
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionSource {
    pub from: Option<Box<RowsSource>>,
    pub items: Vec<SelectItem>,
    pub filter: Option<ValueExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CteDefinition {
    pub id: NodeId,
    pub range: TextRange,
    pub name: EntryId,
    pub columns: Vec<EntryId>,
    pub query: Box<RowsSource>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WithQuery {
    pub recursive: bool,
    pub ctes: Vec<CteDefinition>,
    pub body: Box<RowsSource>,
}

/// Placeholder for a part of the tree that could not be modeled
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidSource {
    /// Reported each time the node is propagated
    pub error: SemanticError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Integer,
    Decimal,
    String,
    Boolean,
    Null,
}

/// Value expressions, reduced to what name resolution needs
#[derive(Debug, Clone, PartialEq)]
pub enum ValueExpr {
    Column {
        range: TextRange,
        qualifier: Option<EntryId>,
        name: EntryId,
    },
    Literal {
        range: TextRange,
        kind: LiteralKind,
    },
    /// Scalar or `EXISTS`/`IN` subquery
    Subquery {
        range: TextRange,
        query: Box<RowsSource>,
    },
    /// `name(arguments...)`
    Call {
        range: TextRange,
        name: EntryId,
        arguments: Vec<ValueExpr>,
    },
    /// Any other expression; only its operands matter
    Composite {
        range: TextRange,
        operands: Vec<ValueExpr>,
    },
}

impl ValueExpr {
    pub fn range(&self) -> TextRange {
        match self {
            ValueExpr::Column { range, .. }
            | ValueExpr::Literal { range, .. }
            | ValueExpr::Subquery { range, .. }
            | ValueExpr::Call { range, .. }
            | ValueExpr::Composite { range, .. } => *range,
        }
    }

    /// Row sources nested inside this expression
    pub fn subqueries(&self) -> Vec<&RowsSource> {
        let mut found = Vec::new();
        self.collect_subqueries(&mut found);
        found
    }

    fn collect_subqueries<'a>(&'a self, found: &mut Vec<&'a RowsSource>) {
        match self {
            ValueExpr::Subquery { query, .. } => found.push(query),
            ValueExpr::Call {
                arguments: operands,
                ..
            }
            | ValueExpr::Composite { operands, .. } => {
                for operand in operands {
                    operand.collect_subqueries(found);
                }
            }
            ValueExpr::Column { .. } | ValueExpr::Literal { .. } => {}
        }
    }
}

impl RowsSource {
    pub(crate) fn new(id: NodeId, range: TextRange, kind: RowsSourceKind) -> Self {
        Self { id, range, kind }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    pub fn kind(&self) -> &RowsSourceKind {
        &self.kind
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            RowsSourceKind::Table(_) => "table",
            RowsSourceKind::CteReference(_) => "cte-reference",
            RowsSourceKind::Correlated(_) => "correlated",
            RowsSourceKind::Join(_) => "join",
            RowsSourceKind::SetOperation(_) => "set-operation",
            RowsSourceKind::Subquery(_) => "subquery",
            RowsSourceKind::Values(_) => "values",
            RowsSourceKind::Projection(_) => "projection",
            RowsSourceKind::With(_) => "with",
            RowsSourceKind::Invalid(_) => "invalid",
        }
    }

    /// Direct child row sources, including subqueries inside expressions
    pub fn children(&self) -> Vec<&RowsSource> {
        match &self.kind {
            RowsSourceKind::Table(_)
            | RowsSourceKind::CteReference(_)
            | RowsSourceKind::Invalid(_) => Vec::new(),
            RowsSourceKind::Correlated(c) => vec![c.source.as_ref()],
            RowsSourceKind::Join(j) => {
                let mut children = vec![j.left.as_ref(), j.right.as_ref()];
                if let JoinCondition::On(expr) = &j.condition {
                    children.extend(expr.subqueries());
                }
                children
            }
            RowsSourceKind::SetOperation(s) => s.operands.iter().collect(),
            RowsSourceKind::Subquery(s) => vec![s.query.as_ref()],
            RowsSourceKind::Values(v) => v
                .rows
                .iter()
                .flat_map(|row| row.values.iter().flat_map(ValueExpr::subqueries))
                .collect(),
            RowsSourceKind::Projection(p) => {
                let mut children: Vec<&RowsSource> = p.from.iter().map(|f| f.as_ref()).collect();
                for item in &p.items {
                    if let SelectItem::Expr { expr, .. } = item {
                        children.extend(expr.subqueries());
                    }
                }
                if let Some(filter) = &p.filter {
                    children.extend(filter.subqueries());
                }
                children
            }
            RowsSourceKind::With(w) => {
                let mut children: Vec<&RowsSource> = w.ctes.iter().map(|c| c.query.as_ref()).collect();
                children.push(w.body.as_ref());
                children
            }
        }
    }

    /// Derive this node's output context from `input`
    ///
    /// Never fails: problems become diagnostics on `rc`. Running the pass a
    /// second time over the same model produces the same outputs and leaves
    /// the symbol table unchanged.
    pub fn propagate_context(&self, input: &DataContext, rc: &mut RecognitionContext<'_>) -> DataContext {
        self.track(input, rc, |rc| match &self.kind {
            RowsSourceKind::Table(t) => t.propagate(self, input, rc),
            RowsSourceKind::CteReference(c) => c.propagate(self, input, rc),
            RowsSourceKind::Correlated(c) => c.propagate(self, input, rc),
            RowsSourceKind::Join(j) => j.propagate(self, input, rc),
            RowsSourceKind::SetOperation(s) => s.propagate(self, input, rc),
            RowsSourceKind::Subquery(s) => s.propagate(self, input, rc),
            RowsSourceKind::Values(v) => v.propagate(self, input, rc),
            RowsSourceKind::Projection(p) => p.propagate(self, input, rc),
            RowsSourceKind::With(w) => w.propagate(self, input, rc),
            RowsSourceKind::Invalid(i) => {
                rc.report_diagnostic(self.range, i.error.clone());
                input.override_result_tuple(Vec::new())
            }
        })
    }

    /// Cancellation, depth accounting and output recording around `f`
    fn track<'r>(
        &self,
        input: &DataContext,
        rc: &mut RecognitionContext<'r>,
        f: impl FnOnce(&mut RecognitionContext<'r>) -> DataContext,
    ) -> DataContext {
        if rc.is_cancelled() {
            return input.clone();
        }
        if !rc.enter() {
            let limit = rc.config().max_depth;
            rc.report_diagnostic(self.range, SemanticError::RecursionLimit { limit });
            let output = input.override_result_tuple(Vec::new());
            rc.record_output(self.id, output.clone());
            return output;
        }

        trace!(node = %self.id, kind = self.kind_name(), depth = rc.depth(), "Propagating");
        let output = f(rc);
        rc.exit();
        rc.record_output(self.id, output.clone());
        output
    }
}
