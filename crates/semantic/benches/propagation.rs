// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Propagation performance benchmarks
//!
//! Measures model building and propagation over growing join chains and
//! nested subqueries.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use querymodel_catalog::{ColumnMetadata, DataType, StaticCatalog, TableMetadata};
use querymodel_semantic::{AnalysisConfig, DataContext, QueryModel, SemanticAnalyzer};
use querymodel_test_utils::{MockSyntaxNode, SqlTreeBuilder};

fn catalog(tables: usize) -> StaticCatalog {
    StaticCatalog::from_tables((0..tables).map(|i| {
        TableMetadata::new(format!("t{}", i), "public").with_columns(vec![
            ColumnMetadata::new("id", DataType::Integer),
            ColumnMetadata::new(format!("c{}", i), DataType::Text),
        ])
    }))
}

/// SELECT a0.id, ... FROM t0 AS a0 JOIN t1 AS a1 ON a0.id = a1.id JOIN ...
fn join_chain(tables: usize) -> MockSyntaxNode {
    let mut sql = SqlTreeBuilder::new();
    let first = sql.table("t0");
    let mut from = sql.aliased(first, "a0", &[]);
    for i in 1..tables {
        let table = sql.table(&format!("t{}", i));
        let aliased = sql.aliased(table, &format!("a{}", i), &[]);
        let left = sql.col(&format!("a{}.id", i - 1));
        let right = sql.col(&format!("a{}.id", i));
        let on = sql.binary(left, "=", right);
        from = sql.join_on(from, "JOIN", aliased, on);
    }
    let items: Vec<_> = (0..tables).map(|i| sql.col(&format!("a{}.c{}", i, i))).collect();
    sql.select(items, vec![from], None)
}

/// SELECT * FROM (SELECT * FROM (... t0 ...) AS q1) AS q0
fn nested_subqueries(depth: usize) -> MockSyntaxNode {
    let mut sql = SqlTreeBuilder::new();
    let table = sql.table("t0");
    let mut query = sql.select_star(table);
    for i in 0..depth {
        let subquery = sql.subquery(query);
        let aliased = sql.aliased(subquery, &format!("q{}", i), &[]);
        query = sql.select_star(aliased);
    }
    query
}

fn bench_build(c: &mut Criterion) {
    let root = join_chain(8);
    c.bench_function("propagation/build_join_chain_8", |b| {
        b.iter(|| black_box(QueryModel::build(&&root)));
    });
}

fn bench_join_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("propagation/join_chain");
    let analyzer = SemanticAnalyzer::new(AnalysisConfig::default());

    for tables in [2, 8, 32] {
        let lookup = catalog(tables);
        let root = join_chain(tables);
        group.bench_with_input(BenchmarkId::from_parameter(tables), &tables, |b, _| {
            b.iter(|| {
                let mut model = QueryModel::build(&&root);
                let outcome = analyzer.propagate(&mut model, &lookup, &DataContext::empty(), None);
                black_box(outcome)
            });
        });
    }
    group.finish();
}

fn bench_repropagation(c: &mut Criterion) {
    let analyzer = SemanticAnalyzer::new(AnalysisConfig::default());
    let lookup = catalog(8);
    let root = join_chain(8);
    let mut model = QueryModel::build(&&root);
    let _ = analyzer.propagate(&mut model, &lookup, &DataContext::empty(), None);

    // symbols are already classified, so this is the steady-state cost
    c.bench_function("propagation/repropagate_join_chain_8", |b| {
        b.iter(|| black_box(analyzer.propagate(&mut model, &lookup, &DataContext::empty(), None)));
    });
}

fn bench_nested_subqueries(c: &mut Criterion) {
    let mut group = c.benchmark_group("propagation/nested_subqueries");
    let analyzer = SemanticAnalyzer::new(AnalysisConfig::default());
    let lookup = catalog(1);

    for depth in [4, 16, 32] {
        let root = nested_subqueries(depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| {
                let mut model = QueryModel::build(&&root);
                black_box(analyzer.propagate(&mut model, &lookup, &DataContext::empty(), None))
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_build,
    bench_join_chain,
    bench_repropagation,
    bench_nested_subqueries
);
criterion_main!(benches);
