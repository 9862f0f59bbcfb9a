// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Symbols and symbol entries
//!
//! Every identifier occurrence in a query is a [`SymbolEntry`]. Each entry
//! refers to exactly one [`Symbol`], and several entries may share a symbol
//! once they are resolved to the same thing: `u` in `users AS u` and in
//! `u.id` end up pointing at one table-alias symbol.
//!
//! Symbols and entries live in a [`SymbolTable`] arena and are addressed by
//! [`SymbolId`] and [`EntryId`] handles. The table records, but never exposes,
//! mutation outside the crate: classification and definitions are written at
//! most once, which is what makes re-running a propagation pass idempotent.
//!
//! ## Examples
//!
//! ```rust
//! use querymodel_ir::TextRange;
//! use querymodel_semantic::{SymbolClass, SymbolTable};
//!
//! let mut symbols = SymbolTable::new();
//! let entry = symbols.new_entry(TextRange::new(14, 19), "users");
//!
//! assert!(symbols.is_not_classified(entry));
//! assert_eq!(symbols.entry(entry).name(), "users");
//! assert_eq!(symbols.entry_symbol(entry).class(), SymbolClass::Unclassified);
//! ```

use std::collections::{HashMap, HashSet};

use querymodel_ir::{DataType, TextRange};
use serde::Serialize;
use tracing::trace;

use crate::model::NodeId;

/// Handle of a [`Symbol`] in a [`SymbolTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SymbolId(u32);

impl SymbolId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle of a [`SymbolEntry`] in a [`SymbolTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EntryId(u32);

impl EntryId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a symbol turned out to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SymbolClass {
    Unclassified,
    TableName,
    TableAlias,
    Column,
    ColumnDerived,
    ProcedureName,
    /// Field of a composite-typed column
    CompositeField,
    Ambiguous,
    Error,
}

impl SymbolClass {
    pub fn is_error(&self) -> bool {
        matches!(self, SymbolClass::Error | SymbolClass::Ambiguous)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolClass::Unclassified => "unclassified",
            SymbolClass::TableName => "table",
            SymbolClass::TableAlias => "table-alias",
            SymbolClass::Column => "column",
            SymbolClass::ColumnDerived => "derived-column",
            SymbolClass::ProcedureName => "procedure",
            SymbolClass::CompositeField => "composite-field",
            SymbolClass::Ambiguous => "ambiguous",
            SymbolClass::Error => "error",
        }
    }
}

/// Where a symbol (or an entry) comes from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum SymbolDefinition {
    /// Declared by this identifier occurrence
    Entry(EntryId),
    /// Introduced by renaming another symbol
    Symbol(SymbolId),
    /// A catalog column
    Column { table: String, column: String },
    /// A catalog table
    Table(String),
    /// Produced anonymously by a row source (VALUES, unnamed projection items)
    Source(NodeId),
}

/// Semantic identity shared by every entry that refers to the same thing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Symbol {
    name: String,
    quoted: bool,
    class: SymbolClass,
    definition: Option<SymbolDefinition>,
    data_type: Option<DataType>,
}

impl Symbol {
    fn new(name: impl Into<String>, quoted: bool) -> Self {
        Self {
            name: name.into(),
            quoted,
            class: SymbolClass::Unclassified,
            definition: None,
            data_type: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_quoted(&self) -> bool {
        self.quoted
    }

    pub fn class(&self) -> SymbolClass {
        self.class
    }

    pub fn definition(&self) -> Option<&SymbolDefinition> {
        self.definition.as_ref()
    }

    pub fn data_type(&self) -> Option<&DataType> {
        self.data_type.as_ref()
    }
}

/// One identifier occurrence in the query text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolEntry {
    range: TextRange,
    text: String,
    name: String,
    quoted: bool,
    symbol: SymbolId,
    definition: Option<SymbolDefinition>,
}

impl SymbolEntry {
    pub fn range(&self) -> TextRange {
        self.range
    }

    /// Raw source text, quotes included
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Identifier name with quotes removed
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_quoted(&self) -> bool {
        self.quoted
    }

    pub fn symbol(&self) -> SymbolId {
        self.symbol
    }

    /// Entry-level provenance, set only for entries that rename a column
    pub fn definition(&self) -> Option<&SymbolDefinition> {
        self.definition.as_ref()
    }
}

/// Strip identifier quoting
///
/// Handles `"x"`, `` `x` `` and `[x]`, collapsing doubled quote characters.
pub fn unquote(text: &str) -> (String, bool) {
    let quotes = [('"', '"'), ('`', '`'), ('[', ']')];
    for (open, close) in quotes {
        if text.len() >= 2 && text.starts_with(open) && text.ends_with(close) {
            let inner = &text[open.len_utf8()..text.len() - close.len_utf8()];
            let doubled: String = [close, close].iter().collect();
            return (inner.replace(&doubled, &close.to_string()), true);
        }
    }
    (text.to_string(), false)
}

/// Arena owning every symbol and entry of one query model
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    entries: Vec<SymbolEntry>,
    interned: HashMap<(NodeId, usize), SymbolId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh, unclassified symbol
    pub fn new_symbol(&mut self, name: impl Into<String>) -> SymbolId {
        self.push_symbol(Symbol::new(name, false))
    }

    /// Record an identifier occurrence with its own fresh symbol
    pub fn new_entry(&mut self, range: TextRange, text: impl Into<String>) -> EntryId {
        let text = text.into();
        let (name, quoted) = unquote(&text);
        self.new_named_entry(range, text, name, quoted)
    }

    /// Record an occurrence whose name was already unquoted, such as the
    /// dotted name of a qualified table reference
    pub(crate) fn new_named_entry(&mut self, range: TextRange, text: String, name: String, quoted: bool) -> EntryId {
        let symbol = self.push_symbol(Symbol::new(name.clone(), quoted));
        let id = EntryId(self.entries.len() as u32);
        self.entries.push(SymbolEntry {
            range,
            text,
            name,
            quoted,
            symbol,
            definition: None,
        });
        id
    }

    fn push_symbol(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(symbol);
        id
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.index()]
    }

    pub fn entry(&self, id: EntryId) -> &SymbolEntry {
        &self.entries[id.index()]
    }

    /// Symbol an entry currently refers to
    pub fn entry_symbol(&self, id: EntryId) -> &Symbol {
        self.symbol(self.entry(id).symbol)
    }

    pub fn entries(&self) -> impl Iterator<Item = (EntryId, &SymbolEntry)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| (EntryId(i as u32), e))
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_not_classified(&self, entry: EntryId) -> bool {
        self.entry_symbol(entry).class == SymbolClass::Unclassified
    }

    /// Classify a symbol; no-op if it is already classified
    ///
    /// Returns whether the class was written.
    pub(crate) fn classify(&mut self, id: SymbolId, class: SymbolClass) -> bool {
        let symbol = &mut self.symbols[id.index()];
        if symbol.class != SymbolClass::Unclassified {
            return false;
        }
        trace!(symbol = %symbol.name, class = class.as_str(), "Classified symbol");
        symbol.class = class;
        true
    }

    /// Set a symbol's definition; no-op if one is already set
    pub(crate) fn set_definition(&mut self, id: SymbolId, definition: SymbolDefinition) -> bool {
        let symbol = &mut self.symbols[id.index()];
        if symbol.definition.is_some() {
            return false;
        }
        symbol.definition = Some(definition);
        true
    }

    pub(crate) fn set_data_type(&mut self, id: SymbolId, data_type: Option<DataType>) {
        let symbol = &mut self.symbols[id.index()];
        if symbol.data_type.is_none() {
            symbol.data_type = data_type;
        }
    }

    pub(crate) fn set_entry_definition(&mut self, id: EntryId, definition: SymbolDefinition) -> bool {
        let entry = &mut self.entries[id.index()];
        if entry.definition.is_some() {
            return false;
        }
        entry.definition = Some(definition);
        true
    }

    /// Point an entry at a resolved symbol
    ///
    /// Only an entry still holding its own unclassified symbol is rebound, so
    /// a resolved entry keeps its first resolution.
    pub(crate) fn bind_entry(&mut self, id: EntryId, target: SymbolId) -> bool {
        let current = self.entries[id.index()].symbol;
        if current == target {
            return true;
        }
        if self.symbols[current.index()].class != SymbolClass::Unclassified {
            return false;
        }
        self.entries[id.index()].symbol = target;
        true
    }

    /// Symbol for the `index`-th column produced by a row source
    ///
    /// The same `(node, index)` pair always yields the same symbol.
    pub(crate) fn intern_column(&mut self, node: NodeId, index: usize, name: &str) -> SymbolId {
        if let Some(id) = self.interned.get(&(node, index)) {
            return *id;
        }
        let id = self.new_symbol(name);
        self.interned.insert((node, index), id);
        id
    }

    /// Follow the definition chain of an entry to where its value originates
    ///
    /// `a` in `T AS t(a)` resolves through the renamed column to the catalog
    /// column of `T`. Cycles stop at the first repeated link.
    pub fn resolve_definition(&self, id: EntryId) -> Option<SymbolDefinition> {
        let entry = self.entry(id);
        let mut current = entry
            .definition
            .clone()
            .or_else(|| self.symbol(entry.symbol).definition.clone())?;
        let mut seen = HashSet::new();

        loop {
            if !seen.insert(current.clone()) {
                return Some(current);
            }
            let next = match &current {
                SymbolDefinition::Entry(e) => self.entry(*e).definition.clone(),
                SymbolDefinition::Symbol(s) => self.symbol(*s).definition.clone(),
                _ => None,
            };
            match next {
                Some(next) => current = next,
                None => return Some(current),
            }
        }
    }

    /// Every entry referring to the given symbol
    pub fn references(&self, symbol: SymbolId) -> Vec<EntryId> {
        self.entries()
            .filter(|(_, e)| e.symbol == symbol)
            .map(|(id, _)| id)
            .collect()
    }

    /// Innermost entry covering a byte offset
    pub fn entry_at(&self, offset: usize) -> Option<EntryId> {
        self.entries()
            .filter(|(_, e)| e.range.contains(offset))
            .min_by_key(|(_, e)| e.range.len())
            .map(|(id, _)| id)
    }
}
