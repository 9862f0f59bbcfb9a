// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Data context
//!
//! A [`DataContext`] is what a row source can see and what it produces: the
//! current result tuple, the table aliases in scope, the CTEs in scope and a
//! link to the enclosing query's context.
//!
//! Contexts are immutable values. Every operation returns a new context and
//! leaves its receiver untouched, with the backing lists shared through
//! [`Arc`], so a context handed to a child row source can never be changed by
//! that child.

use std::sync::Arc;

use querymodel_ir::DataType;

use crate::config::AnalysisConfig;
use crate::model::NodeId;
use crate::symbol::SymbolId;

/// One column of a result tuple
#[derive(Debug, Clone, PartialEq)]
pub struct ResultColumn {
    pub symbol: SymbolId,
    pub name: String,
    /// Row source that produced the column
    pub source: NodeId,
    pub origin_table: Option<String>,
    pub origin_column: Option<String>,
    pub data_type: Option<DataType>,
}

impl ResultColumn {
    pub fn new(symbol: SymbolId, name: impl Into<String>, source: NodeId) -> Self {
        Self {
            symbol,
            name: name.into(),
            source,
            origin_table: None,
            origin_column: None,
            data_type: None,
        }
    }

    pub fn with_origin(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.origin_table = Some(table.into());
        self.origin_column = Some(column.into());
        self
    }

    pub fn with_data_type(mut self, data_type: Option<DataType>) -> Self {
        self.data_type = data_type;
        self
    }

    /// Label used when listing candidates of an ambiguous reference
    pub fn source_label(&self) -> String {
        match &self.origin_table {
            Some(table) => table.clone(),
            None => format!("<{}>", self.source),
        }
    }
}

/// A table alias (or implicit table-name binding) in scope
#[derive(Debug, Clone, PartialEq)]
pub struct AliasBinding {
    pub name: String,
    pub quoted: bool,
    pub symbol: SymbolId,
    /// Row source whose output the alias names
    pub source: NodeId,
    /// Hidden bindings occupy their name but cannot be referenced
    pub visible: bool,
}

impl AliasBinding {
    pub fn new(name: impl Into<String>, quoted: bool, symbol: SymbolId, source: NodeId) -> Self {
        Self {
            name: name.into(),
            quoted,
            symbol,
            source,
            visible: true,
        }
    }
}

/// A common table expression in scope
#[derive(Debug, Clone, PartialEq)]
pub struct CteBinding {
    pub name: String,
    pub quoted: bool,
    pub symbol: SymbolId,
    pub source: NodeId,
    pub columns: Arc<Vec<ResultColumn>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataContext {
    columns: Arc<Vec<ResultColumn>>,
    aliases: Arc<Vec<AliasBinding>>,
    ctes: Arc<Vec<CteBinding>>,
    outer: Option<Arc<DataContext>>,
}

impl DataContext {
    /// Context with no columns, aliases or enclosing scope
    pub fn empty() -> Self {
        Self::default()
    }

    /// Current result tuple
    pub fn columns(&self) -> &[ResultColumn] {
        &self.columns
    }

    /// Owned copy of the current result tuple
    pub fn get_columns_list(&self) -> Vec<ResultColumn> {
        self.columns.as_ref().clone()
    }

    /// Alias bindings of the current scope, hidden ones included
    pub fn aliases(&self) -> &[AliasBinding] {
        &self.aliases
    }

    pub fn ctes(&self) -> &[CteBinding] {
        &self.ctes
    }

    pub fn outer(&self) -> Option<&DataContext> {
        self.outer.as_deref()
    }

    /// Replace the result tuple, keeping everything else
    pub fn override_result_tuple(&self, columns: Vec<ResultColumn>) -> DataContext {
        DataContext {
            columns: Arc::new(columns),
            ..self.clone()
        }
    }

    /// Add an alias to the current scope
    ///
    /// Fails with the existing binding if the name is already taken in this
    /// scope. Hidden bindings count: they are invisible, not absent.
    pub fn extend_with_table_alias(
        &self,
        binding: AliasBinding,
        config: &AnalysisConfig,
    ) -> Result<DataContext, AliasBinding> {
        if let Some(existing) = self
            .aliases
            .iter()
            .find(|b| config.names_match(&b.name, b.quoted, &binding.name, binding.quoted))
        {
            return Err(existing.clone());
        }
        let mut aliases = self.aliases.as_ref().clone();
        aliases.push(binding);
        Ok(DataContext {
            aliases: Arc::new(aliases),
            ..self.clone()
        })
    }

    /// Mark every alias of the current scope as hidden
    pub fn with_hidden_aliases(&self) -> DataContext {
        self.map_aliases(|_| false)
    }

    /// Make aliases visible again if they are visible in `reference`
    ///
    /// Bindings are matched by the row source they name, so aliases hidden
    /// by an enclosing scope stay hidden.
    pub fn with_aliases_revealed_by(&self, reference: &DataContext) -> DataContext {
        self.map_aliases(|binding| {
            binding.visible
                || reference
                    .aliases
                    .iter()
                    .any(|r| r.visible && r.source == binding.source && r.symbol == binding.symbol)
        })
    }

    fn map_aliases(&self, visible: impl Fn(&AliasBinding) -> bool) -> DataContext {
        let aliases = self
            .aliases
            .iter()
            .map(|b| AliasBinding {
                visible: visible(b),
                ..b.clone()
            })
            .collect();
        DataContext {
            aliases: Arc::new(aliases),
            ..self.clone()
        }
    }

    /// Fresh scope for a nested query
    ///
    /// The tuple and aliases start empty, CTEs stay in scope, and this
    /// context becomes the outer context.
    pub fn nested_scope(&self) -> DataContext {
        DataContext {
            columns: Arc::default(),
            aliases: Arc::default(),
            ctes: self.ctes.clone(),
            outer: Some(Arc::new(self.clone())),
        }
    }

    /// Bring a CTE into scope, shadowing any earlier CTE of the same name
    pub fn with_cte(&self, binding: CteBinding) -> DataContext {
        let mut ctes = self.ctes.as_ref().clone();
        ctes.push(binding);
        DataContext {
            ctes: Arc::new(ctes),
            ..self.clone()
        }
    }

    pub fn find_cte(&self, name: &str, quoted: bool, config: &AnalysisConfig) -> Option<&CteBinding> {
        self.ctes
            .iter()
            .rev()
            .find(|c| config.names_match(&c.name, c.quoted, name, quoted))
    }

    /// Look up a visible alias, innermost scope first
    pub fn find_alias(&self, name: &str, quoted: bool, config: &AnalysisConfig) -> Option<&AliasBinding> {
        let local = self
            .aliases
            .iter()
            .filter(|b| b.visible)
            .find(|b| config.names_match(&b.name, b.quoted, name, quoted));
        match local {
            Some(binding) => Some(binding),
            None => self.outer.as_deref()?.find_alias(name, quoted, config),
        }
    }

    /// Columns of the current tuple with the given name
    pub fn find_local_columns(&self, name: &str, quoted: bool, config: &AnalysisConfig) -> Vec<&ResultColumn> {
        self.columns
            .iter()
            .filter(|c| config.names_match(&c.name, false, name, quoted))
            .collect()
    }

    /// Columns with the given name, innermost scope first
    ///
    /// The first scope with any match wins; an outer query is only searched
    /// when the current tuple has no column of that name.
    pub fn find_columns(&self, name: &str, quoted: bool, config: &AnalysisConfig) -> Vec<&ResultColumn> {
        let local = self.find_local_columns(name, quoted, config);
        if !local.is_empty() {
            return local;
        }
        match self.outer.as_deref() {
            Some(outer) => outer.find_columns(name, quoted, config),
            None => Vec::new(),
        }
    }
}
