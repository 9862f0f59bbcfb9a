// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Shared helpers for semantic integration tests

#![allow(dead_code)]

use querymodel_catalog::{ColumnMetadata, DataType, StaticCatalog, TableMetadata};
use querymodel_semantic::{
    AnalysisConfig, AnalysisOutcome, DataContext, DiagnosticKind, EntryId, QueryModel, SemanticAnalyzer,
    SymbolClass,
};
use querymodel_test_utils::{MockSyntaxNode, SchemaFixtures};
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// `s(x, y, z)`, `t(id, name)`, `users(id, email)`, `orders(id, user_id, total)`
pub fn catalog() -> StaticCatalog {
    let mut catalog =
        StaticCatalog::from_yaml(SchemaFixtures::correlation_yaml()).expect("fixture schema parses");
    catalog.insert(TableMetadata::new("users", "public").with_columns(vec![
        ColumnMetadata::new("id", DataType::Integer),
        ColumnMetadata::new("email", DataType::Text),
    ]));
    catalog.insert(TableMetadata::new("orders", "public").with_columns(vec![
        ColumnMetadata::new("id", DataType::Integer),
        ColumnMetadata::new("user_id", DataType::Integer),
        ColumnMetadata::new("total", DataType::Decimal),
    ]));
    catalog
}

pub fn analyze(root: &MockSyntaxNode) -> (QueryModel, AnalysisOutcome) {
    analyze_with(root, AnalysisConfig::default())
}

pub fn analyze_with(root: &MockSyntaxNode, config: AnalysisConfig) -> (QueryModel, AnalysisOutcome) {
    init_tracing();
    let analyzer = SemanticAnalyzer::new(config);
    let mut model = analyzer.build(&root);
    let outcome = analyzer
        .propagate(&mut model, &catalog(), &DataContext::empty(), None)
        .expect("pass was not cancelled");
    (model, outcome)
}

pub fn column_names(context: &DataContext) -> Vec<String> {
    context.columns().iter().map(|c| c.name.clone()).collect()
}

pub fn diagnostic_kinds(outcome: &AnalysisOutcome) -> Vec<DiagnosticKind> {
    outcome.diagnostics().iter().map(|d| d.kind).collect()
}

/// The `nth` entry (in build order) whose name is `name`
pub fn entry_named(model: &QueryModel, name: &str, nth: usize) -> EntryId {
    model
        .symbols()
        .entries()
        .filter(|(_, e)| e.name() == name)
        .map(|(id, _)| id)
        .nth(nth)
        .unwrap_or_else(|| panic!("no entry #{} named '{}'", nth, name))
}

pub fn class_of(model: &QueryModel, name: &str, nth: usize) -> SymbolClass {
    let entry = entry_named(model, name, nth);
    model.symbols().entry_symbol(entry).class()
}
