// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Mock syntax trees for testing the model builder
//!
//! [`SqlTreeBuilder`] hands out nodes shaped like a SQL parser's output
//! without needing a grammar. Every leaf gets the next free byte range, as if
//! the leaves were written left to right separated by single spaces, and
//! every inner node spans its children.

use querymodel_ir::syntax::kind;
use querymodel_ir::{SyntaxNode, TextRange};

/// Mock syntax node for testing
#[derive(Debug, Clone, PartialEq)]
pub struct MockSyntaxNode {
    pub kind: String,
    pub text: Option<String>,
    pub range: TextRange,
    pub children: Vec<MockSyntaxNode>,
}

impl MockSyntaxNode {
    pub fn leaf(kind: impl Into<String>, text: impl Into<String>, range: TextRange) -> Self {
        Self {
            kind: kind.into(),
            text: Some(text.into()),
            range,
            children: Vec::new(),
        }
    }

    /// Inner node spanning its children
    pub fn branch(kind: impl Into<String>, children: Vec<MockSyntaxNode>) -> Self {
        let range = children
            .iter()
            .map(|c| c.range)
            .reduce(|a, b| a.cover(b))
            .unwrap_or_default();
        Self {
            kind: kind.into(),
            text: None,
            range,
            children,
        }
    }

    /// Depth-first search for the first node of a kind with the given text
    pub fn find(&self, kind: &str, text: &str) -> Option<&MockSyntaxNode> {
        if self.kind == kind && self.text.as_deref() == Some(text) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(kind, text))
    }
}

impl<'a> SyntaxNode for &'a MockSyntaxNode {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn range(&self) -> TextRange {
        self.range
    }

    fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    fn children(&self) -> Vec<Self> {
        self.children.iter().collect()
    }
}

/// Fluent factory for SQL-shaped mock trees
#[derive(Debug, Default)]
pub struct SqlTreeBuilder {
    cursor: usize,
}

impl SqlTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leaf of any kind at the next free range
    pub fn token(&mut self, kind: &str, text: &str) -> MockSyntaxNode {
        let range = TextRange::new(self.cursor, self.cursor + text.len());
        self.cursor = range.end + 1;
        MockSyntaxNode::leaf(kind, text, range)
    }

    pub fn ident(&mut self, text: &str) -> MockSyntaxNode {
        self.token(kind::IDENTIFIER, text)
    }

    fn identifiers(&mut self, kind: &str, names: &[&str]) -> MockSyntaxNode {
        let children = names.iter().map(|n| self.ident(n)).collect();
        MockSyntaxNode::branch(kind, children)
    }

    // ===== Row sources =====

    /// `name` or `schema.name`
    pub fn table(&mut self, name: &str) -> MockSyntaxNode {
        let parts: Vec<&str> = name.split('.').collect();
        self.identifiers(kind::TABLE_REFERENCE, &parts)
    }

    /// `source AS alias (columns...)`
    pub fn aliased(&mut self, source: MockSyntaxNode, alias: &str, columns: &[&str]) -> MockSyntaxNode {
        let mut children = vec![source, self.ident(alias)];
        if !columns.is_empty() {
            children.push(self.identifiers(kind::COLUMN_LIST, columns));
        }
        MockSyntaxNode::branch(kind::ALIASED_SOURCE, children)
    }

    /// `left <keywords> right`, e.g. `"LEFT JOIN"` or `"CROSS JOIN LATERAL"`
    pub fn join(&mut self, left: MockSyntaxNode, keywords: &str, right: MockSyntaxNode) -> MockSyntaxNode {
        let join_type = self.token(kind::JOIN_TYPE, keywords);
        MockSyntaxNode::branch(kind::JOIN, vec![left, join_type, right])
    }

    pub fn join_on(
        &mut self,
        left: MockSyntaxNode,
        keywords: &str,
        right: MockSyntaxNode,
        condition: MockSyntaxNode,
    ) -> MockSyntaxNode {
        let mut join = self.join(left, keywords, right);
        join.children
            .push(MockSyntaxNode::branch(kind::JOIN_CONDITION, vec![condition]));
        MockSyntaxNode::branch(kind::JOIN, join.children)
    }

    pub fn join_using(
        &mut self,
        left: MockSyntaxNode,
        keywords: &str,
        right: MockSyntaxNode,
        columns: &[&str],
    ) -> MockSyntaxNode {
        let mut join = self.join(left, keywords, right);
        join.children.push(self.identifiers(kind::USING_CLAUSE, columns));
        MockSyntaxNode::branch(kind::JOIN, join.children)
    }

    /// `operands[0] operators[0] operands[1] ...`
    pub fn set_operation(&mut self, operands: Vec<MockSyntaxNode>, operators: &[&str]) -> MockSyntaxNode {
        let mut children = Vec::new();
        let mut operators = operators.iter();
        for (index, operand) in operands.into_iter().enumerate() {
            if index > 0 {
                let operator = operators.next().copied().unwrap_or("UNION");
                children.push(self.token(kind::SET_OPERATOR, operator));
            }
            children.push(operand);
        }
        MockSyntaxNode::branch(kind::SET_OPERATION, children)
    }

    pub fn union(&mut self, left: MockSyntaxNode, right: MockSyntaxNode) -> MockSyntaxNode {
        self.set_operation(vec![left, right], &["UNION"])
    }

    pub fn subquery(&mut self, query: MockSyntaxNode) -> MockSyntaxNode {
        MockSyntaxNode::branch(kind::SUBQUERY, vec![query])
    }

    pub fn values(&mut self, rows: Vec<Vec<MockSyntaxNode>>) -> MockSyntaxNode {
        let rows = rows
            .into_iter()
            .map(|row| MockSyntaxNode::branch(kind::VALUES_ROW, row))
            .collect();
        MockSyntaxNode::branch(kind::VALUES, rows)
    }

    /// `SELECT items FROM from WHERE filter`; an empty `from` omits FROM
    pub fn select(
        &mut self,
        items: Vec<MockSyntaxNode>,
        from: Vec<MockSyntaxNode>,
        filter: Option<MockSyntaxNode>,
    ) -> MockSyntaxNode {
        let mut children = vec![MockSyntaxNode::branch(kind::SELECT_LIST, items)];
        if !from.is_empty() {
            children.push(MockSyntaxNode::branch(kind::FROM_CLAUSE, from));
        }
        if let Some(filter) = filter {
            children.push(MockSyntaxNode::branch(kind::WHERE_CLAUSE, vec![filter]));
        }
        MockSyntaxNode::branch(kind::SELECT_STATEMENT, children)
    }

    /// `SELECT * FROM source`
    pub fn select_star(&mut self, source: MockSyntaxNode) -> MockSyntaxNode {
        let star = self.star();
        self.select(vec![star], vec![source], None)
    }

    pub fn cte(&mut self, name: &str, columns: &[&str], query: MockSyntaxNode) -> MockSyntaxNode {
        let mut children = vec![self.ident(name)];
        if !columns.is_empty() {
            children.push(self.identifiers(kind::COLUMN_LIST, columns));
        }
        children.push(query);
        MockSyntaxNode::branch(kind::CTE, children)
    }

    pub fn with(&mut self, recursive: bool, ctes: Vec<MockSyntaxNode>, body: MockSyntaxNode) -> MockSyntaxNode {
        let mut children = Vec::new();
        if recursive {
            children.push(self.token(kind::RECURSIVE, "RECURSIVE"));
        }
        children.extend(ctes);
        children.push(body);
        MockSyntaxNode::branch(kind::WITH_QUERY, children)
    }

    // ===== Select items and expressions =====

    pub fn star(&mut self) -> MockSyntaxNode {
        let star = self.token(kind::WILDCARD, "*");
        MockSyntaxNode { text: None, ..star }
    }

    /// `qualifier.*`
    pub fn star_of(&mut self, qualifier: &str) -> MockSyntaxNode {
        let qualifier = self.ident(qualifier);
        MockSyntaxNode::branch(kind::WILDCARD, vec![qualifier])
    }

    /// `name` or `qualifier.name`
    pub fn col(&mut self, reference: &str) -> MockSyntaxNode {
        let parts: Vec<&str> = reference.split('.').collect();
        self.identifiers(kind::COLUMN_REFERENCE, &parts)
    }

    /// `expr AS alias`
    pub fn item_as(&mut self, expr: MockSyntaxNode, alias: &str) -> MockSyntaxNode {
        let alias = self.ident(alias);
        MockSyntaxNode::branch(kind::SELECT_ITEM, vec![expr, alias])
    }

    pub fn number(&mut self, text: &str) -> MockSyntaxNode {
        self.token(kind::NUMBER_LITERAL, text)
    }

    pub fn string(&mut self, text: &str) -> MockSyntaxNode {
        self.token(kind::STRING_LITERAL, text)
    }

    pub fn null(&mut self) -> MockSyntaxNode {
        self.token(kind::NULL_LITERAL, "NULL")
    }

    /// `left op right`; the operator is kept as an unnamed leaf
    /// `name(arguments...)`
    pub fn call(&mut self, name: &str, arguments: Vec<MockSyntaxNode>) -> MockSyntaxNode {
        let mut children = vec![self.ident(name)];
        children.extend(arguments);
        MockSyntaxNode::branch(kind::FUNCTION_CALL, children)
    }

    pub fn binary(&mut self, left: MockSyntaxNode, op: &str, right: MockSyntaxNode) -> MockSyntaxNode {
        let op = self.token("operator", op);
        MockSyntaxNode::branch("binary_expression", vec![left, op, right])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaves_get_consecutive_ranges() {
        let mut sql = SqlTreeBuilder::new();
        let users = sql.ident("users");
        let u = sql.ident("u");
        assert_eq!(users.range, TextRange::new(0, 5));
        assert_eq!(u.range, TextRange::new(6, 7));
    }

    #[test]
    fn test_branch_spans_children() {
        let mut sql = SqlTreeBuilder::new();
        let table = sql.table("public.users");
        assert_eq!(table.kind, kind::TABLE_REFERENCE);
        assert_eq!(table.children.len(), 2);
        assert_eq!(table.range, TextRange::new(0, 12));
    }

    #[test]
    fn test_syntax_node_view() {
        let mut sql = SqlTreeBuilder::new();
        let table = sql.table("users");
        let aliased = sql.aliased(table, "u", &["a", "b"]);

        let node = &aliased;
        assert_eq!(SyntaxNode::kind(&node), kind::ALIASED_SOURCE);
        assert_eq!(node.children().len(), 3);
        assert!(node.child_of_kind(kind::COLUMN_LIST).is_some());
        assert!(aliased.find(kind::IDENTIFIER, "b").is_some());
    }
}
