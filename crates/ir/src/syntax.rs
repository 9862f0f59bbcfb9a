// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Read-only view of a parsed syntax tree
//!
//! The parser is an external collaborator. The semantic layer only needs a
//! node's kind, its byte range, its text (for identifiers, literals and
//! keywords) and its ordered named children.

use crate::span::TextRange;

/// Generic syntax node
///
/// Implemented for cheap handle types (`&Node`, tree-sitter-like `Copy`
/// nodes), so `children` returns owned handles.
pub trait SyntaxNode: Sized {
    /// Node kind, one of the [`kind`] constants for nodes the model understands
    fn kind(&self) -> &str;

    /// Byte range of this node in the source
    fn range(&self) -> TextRange;

    /// Source text of this node, if available
    fn text(&self) -> Option<&str>;

    /// Ordered named children
    fn children(&self) -> Vec<Self>;

    /// First child of the given kind
    fn child_of_kind(&self, kind: &str) -> Option<Self> {
        self.children().into_iter().find(|c| c.kind() == kind)
    }
}

/// Node kinds consumed by the model builder
pub mod kind {
    // Queries
    pub const SELECT_STATEMENT: &str = "select_statement";
    pub const SELECT_LIST: &str = "select_list";
    pub const SELECT_ITEM: &str = "select_item";
    pub const WILDCARD: &str = "wildcard";
    pub const FROM_CLAUSE: &str = "from_clause";
    pub const WHERE_CLAUSE: &str = "where_clause";
    pub const WITH_QUERY: &str = "with_query";
    pub const CTE: &str = "cte";
    pub const RECURSIVE: &str = "recursive";

    // Row sources
    pub const TABLE_REFERENCE: &str = "table_reference";
    pub const ALIASED_SOURCE: &str = "aliased_source";
    pub const COLUMN_LIST: &str = "column_list";
    pub const JOIN: &str = "join";
    pub const JOIN_TYPE: &str = "join_type";
    pub const JOIN_CONDITION: &str = "join_condition";
    pub const USING_CLAUSE: &str = "using_clause";
    pub const SET_OPERATION: &str = "set_operation";
    pub const SET_OPERATOR: &str = "set_operator";
    pub const SUBQUERY: &str = "subquery";
    pub const VALUES: &str = "values";
    pub const VALUES_ROW: &str = "values_row";

    // Expressions
    pub const IDENTIFIER: &str = "identifier";
    pub const COLUMN_REFERENCE: &str = "column_reference";
    pub const FUNCTION_CALL: &str = "function_call";
    pub const NUMBER_LITERAL: &str = "number_literal";
    pub const STRING_LITERAL: &str = "string_literal";
    pub const BOOLEAN_LITERAL: &str = "boolean_literal";
    pub const NULL_LITERAL: &str = "null_literal";
}
