// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Model builder
//!
//! Turns a parsed syntax tree into a [`QueryModel`]: the row-source tree plus
//! the symbol table holding one entry per identifier occurrence.
//!
//! Building never fails. A node missing a required part becomes an
//! [`InvalidSource`] that reports itself when propagated, so a half-typed
//! query still yields a usable model around the broken part. Nesting deeper
//! than [`AnalysisConfig::max_depth`] is cut off the same way and reports a
//! recursion limit.
//!
//! Whether `FROM name` reads a table or a CTE is decided here, from the
//! `WITH` clauses lexically enclosing the reference.

use tracing::{debug, instrument};

use querymodel_ir::syntax::kind;
use querymodel_ir::{SyntaxNode, TextRange};

use crate::config::AnalysisConfig;
use crate::error::SemanticError;
use crate::model::{
    CorrelatedSource, CteDefinition, CteReference, InvalidSource, JoinCondition, JoinKind, JoinSource,
    LiteralKind, NodeId, ProjectionSource, RowsSource, RowsSourceKind, SelectItem, SetOperationSource,
    SetOperator, SubquerySource, TableSource, ValueExpr, ValuesRow, ValuesSource, WithQuery,
};
use crate::symbol::{unquote, EntryId, SymbolTable};
use crate::visitor::{NodeFinder, TableNameCollector};

/// A query's row-source tree and its symbols
#[derive(Debug, Clone)]
pub struct QueryModel {
    root: RowsSource,
    symbols: SymbolTable,
    node_count: usize,
}

impl QueryModel {
    /// Build with the default configuration
    pub fn build<N: SyntaxNode>(root: &N) -> Self {
        Self::build_with(root, &AnalysisConfig::default())
    }

    #[instrument(skip_all, fields(kind = root.kind()))]
    pub fn build_with<N: SyntaxNode>(root: &N, config: &AnalysisConfig) -> Self {
        let mut builder = ModelBuilder {
            symbols: SymbolTable::new(),
            next_id: 0,
            ctes: Vec::new(),
            depth: 0,
            config,
        };
        let root = builder.query(root);
        debug!(nodes = builder.next_id, entries = builder.symbols.entry_count(), "Built query model");
        Self {
            root,
            symbols: builder.symbols,
            node_count: builder.next_id as usize,
        }
    }

    #[cfg(test)]
    pub(crate) fn from_parts(root: RowsSource, symbols: SymbolTable, node_count: usize) -> Self {
        Self {
            root,
            symbols,
            node_count,
        }
    }

    pub fn root(&self) -> &RowsSource {
        &self.root
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub(crate) fn parts_mut(&mut self) -> (&RowsSource, &mut SymbolTable) {
        (&self.root, &mut self.symbols)
    }

    /// Number of node ids handed out, CTE definitions included
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn find_node(&self, id: NodeId) -> Option<&RowsSource> {
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            if node.id() == id {
                return Some(node);
            }
            stack.extend(node.children());
        }
        None
    }

    /// Catalog tables the query reads, in order of first appearance
    pub fn referenced_tables(&self) -> Vec<String> {
        TableNameCollector::new(&self.symbols).collect(&self.root)
    }

    /// Innermost row source at a byte offset
    pub fn node_at(&self, offset: usize) -> Option<NodeId> {
        NodeFinder::find(&self.root, offset)
    }

    /// Innermost identifier at a byte offset
    pub fn entry_at(&self, offset: usize) -> Option<EntryId> {
        self.symbols.entry_at(offset)
    }
}

struct ModelBuilder<'c> {
    symbols: SymbolTable,
    next_id: u32,
    /// CTE names lexically in scope, innermost last
    ctes: Vec<(String, bool)>,
    /// Nested queries and expressions currently being built
    depth: usize,
    config: &'c AnalysisConfig,
}

impl ModelBuilder<'_> {
    fn alloc(&mut self) -> NodeId {
        let id = NodeId::new(self.next_id);
        self.next_id += 1;
        id
    }

    fn invalid(&mut self, range: TextRange, reason: impl Into<String>) -> RowsSource {
        let reason = reason.into();
        debug!(start = range.start, reason = %reason, "Modeling malformed node as invalid");
        let id = self.alloc();
        let error = SemanticError::MalformedTree(reason);
        RowsSource::new(id, range, RowsSourceKind::Invalid(InvalidSource { error }))
    }

    fn too_deep(&mut self, range: TextRange) -> RowsSource {
        let limit = self.config.max_depth;
        debug!(start = range.start, limit, "Nesting limit reached while building");
        let id = self.alloc();
        let error = SemanticError::RecursionLimit { limit };
        RowsSource::new(id, range, RowsSourceKind::Invalid(InvalidSource { error }))
    }

    /// Run `f` one level deeper; `None` once the configured depth is used up
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> Option<T> {
        if self.depth >= self.config.max_depth {
            return None;
        }
        self.depth += 1;
        let built = f(self);
        self.depth -= 1;
        Some(built)
    }

    fn entry<N: SyntaxNode>(&mut self, node: &N) -> Option<EntryId> {
        let text = node.text()?;
        Some(self.symbols.new_entry(node.range(), text))
    }

    /// Any node that can produce rows
    fn query<N: SyntaxNode>(&mut self, node: &N) -> RowsSource {
        match self.nested(|builder| builder.query_kind(node)) {
            Some(source) => source,
            None => self.too_deep(node.range()),
        }
    }

    fn query_kind<N: SyntaxNode>(&mut self, node: &N) -> RowsSource {
        match node.kind() {
            kind::SELECT_STATEMENT => self.select(node),
            kind::SET_OPERATION => self.set_operation(node),
            kind::WITH_QUERY => self.with_query(node),
            kind::VALUES => self.values(node),
            kind::SUBQUERY => self.subquery(node),
            kind::TABLE_REFERENCE => self.table_reference(node, true),
            kind::ALIASED_SOURCE => self.aliased_source(node),
            kind::JOIN => self.join(node),
            other => {
                let reason = format!("unexpected node kind '{}'", other);
                self.invalid(node.range(), reason)
            }
        }
    }

    fn table_reference<N: SyntaxNode>(&mut self, node: &N, implicit_alias: bool) -> RowsSource {
        let parts: Vec<N> = node
            .children()
            .into_iter()
            .filter(|c| c.kind() == kind::IDENTIFIER)
            .collect();

        let (text, name, quoted) = if parts.is_empty() {
            match node.text() {
                Some(text) => {
                    let (name, quoted) = unquote(text);
                    (text.to_string(), name, quoted)
                }
                None => return self.invalid(node.range(), "table reference without a name"),
            }
        } else {
            let texts: Vec<&str> = parts.iter().filter_map(|p| p.text()).collect();
            let unquoted: Vec<(String, bool)> = texts.iter().map(|t| unquote(t)).collect();
            let quoted = unquoted.last().is_some_and(|(_, q)| *q);
            let name = unquoted
                .into_iter()
                .map(|(n, _)| n)
                .collect::<Vec<_>>()
                .join(".");
            (texts.join("."), name, quoted)
        };

        let id = self.alloc();
        let entry = self.symbols.new_named_entry(node.range(), text, name.clone(), quoted);

        let is_cte = !name.contains('.')
            && self
                .ctes
                .iter()
                .rev()
                .any(|(cte, cte_quoted)| self.config.names_match(cte, *cte_quoted, &name, quoted));

        let source_kind = if is_cte {
            RowsSourceKind::CteReference(CteReference {
                name: entry,
                implicit_alias,
            })
        } else {
            RowsSourceKind::Table(TableSource {
                table: entry,
                implicit_alias,
            })
        };
        RowsSource::new(id, node.range(), source_kind)
    }

    /// `source [AS] alias [(c1, ...)]`
    fn aliased_source<N: SyntaxNode>(&mut self, node: &N) -> RowsSource {
        let children = node.children();
        let source = children
            .iter()
            .find(|c| c.kind() != kind::IDENTIFIER && c.kind() != kind::COLUMN_LIST);
        let Some(source) = source else {
            return self.invalid(node.range(), "aliased source without a source");
        };

        let alias_node = children
            .iter()
            .find(|c| c.kind() == kind::IDENTIFIER && c.text().is_some());
        let Some(alias_node) = alias_node else {
            // `(SELECT ...)` without an alias: keep the source as is
            return self.query(source);
        };

        let id = self.alloc();
        let inner = if source.kind() == kind::TABLE_REFERENCE {
            self.table_reference(source, false)
        } else {
            self.query(source)
        };
        let Some(alias) = self.entry(alias_node) else {
            return inner;
        };

        let columns = match children.iter().find(|c| c.kind() == kind::COLUMN_LIST) {
            Some(list) => self.identifier_list(list),
            None => Vec::new(),
        };

        RowsSource::new(
            id,
            node.range(),
            RowsSourceKind::Correlated(CorrelatedSource {
                source: Box::new(inner),
                alias,
                columns,
            }),
        )
    }

    fn identifier_list<N: SyntaxNode>(&mut self, node: &N) -> Vec<EntryId> {
        node.children()
            .iter()
            .filter(|c| c.kind() == kind::IDENTIFIER)
            .filter_map(|c| self.entry(c))
            .collect()
    }

    fn join<N: SyntaxNode>(&mut self, node: &N) -> RowsSource {
        let children = node.children();
        let mut sources = children.iter().filter(|c| {
            !matches!(
                c.kind(),
                kind::JOIN_TYPE | kind::JOIN_CONDITION | kind::USING_CLAUSE
            )
        });
        let (Some(left), Some(right)) = (sources.next(), sources.next()) else {
            return self.invalid(node.range(), "join needs two sides");
        };

        let keywords = children
            .iter()
            .find(|c| c.kind() == kind::JOIN_TYPE)
            .and_then(|c| c.text())
            .map(str::to_ascii_uppercase)
            .unwrap_or_default();
        let words: Vec<&str> = keywords.split_whitespace().collect();
        let join_kind = if words.contains(&"LEFT") {
            JoinKind::Left
        } else if words.contains(&"RIGHT") {
            JoinKind::Right
        } else if words.contains(&"FULL") {
            JoinKind::Full
        } else if words.contains(&"CROSS") {
            JoinKind::Cross
        } else {
            JoinKind::Inner
        };
        let lateral = words.contains(&"LATERAL");

        let id = self.alloc();
        let left = self.query(left);
        let right = self.query(right);

        let condition = if words.contains(&"NATURAL") {
            JoinCondition::Natural
        } else if let Some(on) = children.iter().find(|c| c.kind() == kind::JOIN_CONDITION) {
            match on.children().first() {
                Some(expr) => JoinCondition::On(self.expr(expr)),
                None => JoinCondition::None,
            }
        } else if let Some(using) = children.iter().find(|c| c.kind() == kind::USING_CLAUSE) {
            JoinCondition::Using(self.identifier_list(using))
        } else {
            JoinCondition::None
        };

        RowsSource::new(
            id,
            node.range(),
            RowsSourceKind::Join(JoinSource {
                left: Box::new(left),
                right: Box::new(right),
                kind: join_kind,
                lateral,
                condition,
            }),
        )
    }

    fn set_operation<N: SyntaxNode>(&mut self, node: &N) -> RowsSource {
        let id = self.alloc();
        let mut operands = Vec::new();
        let mut operators = Vec::new();

        for child in node.children() {
            if child.kind() == kind::SET_OPERATOR {
                operators.push(parse_set_operator(child.text().unwrap_or_default()));
            } else {
                operands.push(self.query(&child));
            }
        }

        RowsSource::new(
            id,
            node.range(),
            RowsSourceKind::SetOperation(SetOperationSource { operands, operators }),
        )
    }

    fn subquery<N: SyntaxNode>(&mut self, node: &N) -> RowsSource {
        let Some(inner) = node.children().into_iter().next() else {
            return self.invalid(node.range(), "empty subquery");
        };
        let id = self.alloc();
        let query = self.query(&inner);
        RowsSource::new(
            id,
            node.range(),
            RowsSourceKind::Subquery(SubquerySource {
                query: Box::new(query),
            }),
        )
    }

    fn values<N: SyntaxNode>(&mut self, node: &N) -> RowsSource {
        let id = self.alloc();
        let rows = node
            .children()
            .iter()
            .filter(|c| c.kind() == kind::VALUES_ROW)
            .map(|row| ValuesRow {
                range: row.range(),
                values: row.children().iter().map(|v| self.expr(v)).collect(),
            })
            .collect();
        RowsSource::new(id, node.range(), RowsSourceKind::Values(ValuesSource { rows }))
    }

    fn select<N: SyntaxNode>(&mut self, node: &N) -> RowsSource {
        let id = self.alloc();
        let from = node.child_of_kind(kind::FROM_CLAUSE).and_then(|f| self.from_clause(&f));
        let filter = node
            .child_of_kind(kind::WHERE_CLAUSE)
            .and_then(|w| w.children().into_iter().next())
            .map(|expr| self.expr(&expr));

        let items = match node.child_of_kind(kind::SELECT_LIST) {
            Some(list) => list.children().iter().map(|item| self.select_item(item)).collect(),
            None => Vec::new(),
        };

        RowsSource::new(
            id,
            node.range(),
            RowsSourceKind::Projection(ProjectionSource {
                from: from.map(Box::new),
                items,
                filter,
            }),
        )
    }

    /// `FROM a, b, c` reads as `(a CROSS JOIN b) CROSS JOIN c`
    fn from_clause<N: SyntaxNode>(&mut self, node: &N) -> Option<RowsSource> {
        let mut sources = node.children().into_iter();
        let first = sources.next()?;
        let mut current = self.query(&first);
        for next in sources {
            let id = self.alloc();
            let right = self.query(&next);
            let range = current.range().cover(right.range());
            current = RowsSource::new(
                id,
                range,
                RowsSourceKind::Join(JoinSource {
                    left: Box::new(current),
                    right: Box::new(right),
                    kind: JoinKind::Cross,
                    lateral: false,
                    condition: JoinCondition::None,
                }),
            );
        }
        Some(current)
    }

    fn select_item<N: SyntaxNode>(&mut self, node: &N) -> SelectItem {
        match node.kind() {
            kind::WILDCARD => SelectItem::Wildcard {
                range: node.range(),
                qualifier: node.child_of_kind(kind::IDENTIFIER).and_then(|q| self.entry(&q)),
            },
            kind::SELECT_ITEM => {
                let children = node.children();
                match children.first() {
                    Some(first) if first.kind() == kind::WILDCARD => SelectItem::Wildcard {
                        range: node.range(),
                        qualifier: first.child_of_kind(kind::IDENTIFIER).and_then(|q| self.entry(&q)),
                    },
                    Some(first) => {
                        let expr = self.expr(first);
                        let alias = children
                            .get(1)
                            .filter(|a| a.kind() == kind::IDENTIFIER)
                            .and_then(|a| self.entry(a));
                        SelectItem::Expr {
                            range: node.range(),
                            expr,
                            alias,
                        }
                    }
                    None => SelectItem::Expr {
                        range: node.range(),
                        expr: ValueExpr::Composite {
                            range: node.range(),
                            operands: Vec::new(),
                        },
                        alias: None,
                    },
                }
            }
            _ => SelectItem::Expr {
                range: node.range(),
                expr: self.expr(node),
                alias: None,
            },
        }
    }

    fn with_query<N: SyntaxNode>(&mut self, node: &N) -> RowsSource {
        let id = self.alloc();
        let children = node.children();
        let recursive = children.iter().any(|c| c.kind() == kind::RECURSIVE);
        let scope_len = self.ctes.len();

        let mut ctes = Vec::new();
        for cte in children.iter().filter(|c| c.kind() == kind::CTE) {
            if let Some(definition) = self.cte(cte, recursive) {
                ctes.push(definition);
            }
        }

        let body = children
            .iter()
            .rev()
            .find(|c| !matches!(c.kind(), kind::CTE | kind::RECURSIVE));
        let body = match body {
            Some(body) => self.query(body),
            None => self.invalid(node.range(), "WITH without a query body"),
        };
        self.ctes.truncate(scope_len);

        RowsSource::new(
            id,
            node.range(),
            RowsSourceKind::With(WithQuery {
                recursive,
                ctes,
                body: Box::new(body),
            }),
        )
    }

    fn cte<N: SyntaxNode>(&mut self, node: &N, recursive: bool) -> Option<CteDefinition> {
        let children = node.children();
        let name_node = children.iter().find(|c| c.kind() == kind::IDENTIFIER)?;
        let name = self.entry(name_node)?;
        let id = self.alloc();
        let columns = match children.iter().find(|c| c.kind() == kind::COLUMN_LIST) {
            Some(list) => self.identifier_list(list),
            None => Vec::new(),
        };

        let entry = self.symbols.entry(name);
        let scoped = (entry.name().to_string(), entry.is_quoted());
        if recursive {
            self.ctes.push(scoped.clone());
        }
        let query = match children
            .iter()
            .find(|c| !matches!(c.kind(), kind::IDENTIFIER | kind::COLUMN_LIST))
        {
            Some(query) => self.query(query),
            None => self.invalid(node.range(), "CTE without a query"),
        };
        if !recursive {
            self.ctes.push(scoped);
        }

        Some(CteDefinition {
            id,
            range: node.range(),
            name,
            columns,
            query: Box::new(query),
        })
    }

    fn expr<N: SyntaxNode>(&mut self, node: &N) -> ValueExpr {
        match self.nested(|builder| builder.expr_kind(node)) {
            Some(expr) => expr,
            // the placeholder row source reports the limit when resolved
            None => ValueExpr::Subquery {
                range: node.range(),
                query: Box::new(self.too_deep(node.range())),
            },
        }
    }

    fn expr_kind<N: SyntaxNode>(&mut self, node: &N) -> ValueExpr {
        let range = node.range();
        match node.kind() {
            kind::COLUMN_REFERENCE => {
                let mut parts: Vec<EntryId> = node
                    .children()
                    .iter()
                    .filter(|c| c.kind() == kind::IDENTIFIER)
                    .filter_map(|c| self.entry(c))
                    .collect();
                if parts.is_empty() {
                    parts.extend(self.entry(node));
                }
                match parts.len() {
                    0 => ValueExpr::Composite {
                        range,
                        operands: Vec::new(),
                    },
                    len => ValueExpr::Column {
                        range,
                        qualifier: (len >= 2).then(|| parts[len - 2]),
                        name: parts[len - 1],
                    },
                }
            }
            kind::IDENTIFIER => match self.entry(node) {
                Some(name) => ValueExpr::Column {
                    range,
                    qualifier: None,
                    name,
                },
                None => ValueExpr::Composite {
                    range,
                    operands: Vec::new(),
                },
            },
            kind::FUNCTION_CALL => {
                let children = node.children();
                let callee = children
                    .first()
                    .filter(|c| c.kind() == kind::IDENTIFIER)
                    .and_then(|c| self.entry(c));
                match callee {
                    Some(name) => ValueExpr::Call {
                        range,
                        name,
                        arguments: children[1..].iter().map(|c| self.expr(c)).collect(),
                    },
                    None => ValueExpr::Composite {
                        range,
                        operands: children.iter().map(|c| self.expr(c)).collect(),
                    },
                }
            }
            kind::NUMBER_LITERAL => {
                let decimal = node
                    .text()
                    .is_some_and(|t| t.contains(['.', 'e', 'E']));
                ValueExpr::Literal {
                    range,
                    kind: if decimal {
                        LiteralKind::Decimal
                    } else {
                        LiteralKind::Integer
                    },
                }
            }
            kind::STRING_LITERAL => ValueExpr::Literal {
                range,
                kind: LiteralKind::String,
            },
            kind::BOOLEAN_LITERAL => ValueExpr::Literal {
                range,
                kind: LiteralKind::Boolean,
            },
            kind::NULL_LITERAL => ValueExpr::Literal {
                range,
                kind: LiteralKind::Null,
            },
            kind::SUBQUERY => {
                let query = match node.children().into_iter().next() {
                    Some(inner) => self.query(&inner),
                    None => self.invalid(range, "empty subquery"),
                };
                ValueExpr::Subquery {
                    range,
                    query: Box::new(query),
                }
            }
            kind::SELECT_STATEMENT | kind::SET_OPERATION | kind::WITH_QUERY | kind::VALUES => {
                ValueExpr::Subquery {
                    range,
                    query: Box::new(self.query(node)),
                }
            }
            _ => ValueExpr::Composite {
                range,
                operands: node.children().iter().map(|c| self.expr(c)).collect(),
            },
        }
    }
}

fn parse_set_operator(text: &str) -> SetOperator {
    let upper = text.to_ascii_uppercase();
    let all = upper.split_whitespace().any(|w| w == "ALL");
    if upper.contains("INTERSECT") {
        if all { SetOperator::IntersectAll } else { SetOperator::Intersect }
    } else if upper.contains("EXCEPT") || upper.contains("MINUS") {
        if all { SetOperator::ExceptAll } else { SetOperator::Except }
    } else if all {
        SetOperator::UnionAll
    } else {
        SetOperator::Union
    }
}
