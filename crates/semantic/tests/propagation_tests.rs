// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Propagation over tables, aliases, projections, set operations and VALUES

mod common;

use common::{analyze, analyze_with, catalog, class_of, column_names, diagnostic_kinds, entry_named};
use querymodel_catalog::DataType;
use querymodel_ir::Dialect;
use querymodel_semantic::{
    AnalysisConfig, DataContext, DiagnosticKind, SemanticAnalyzer, SemanticError, Severity, SymbolClass,
    SymbolDefinition,
};
use querymodel_test_utils::{SchemaFixtures, SqlTreeBuilder};

// ===== Tables and correlation =====

#[test]
fn test_column_list_renames_leading_columns() {
    // SELECT * FROM s AS sx(a, b)
    let mut sql = SqlTreeBuilder::new();
    let s = sql.table("s");
    let aliased = sql.aliased(s, "sx", &["a", "b"]);
    let root = sql.select_star(aliased);

    let (model, outcome) = analyze(&root);

    assert!(outcome.diagnostics().is_empty());
    let columns = outcome.final_context().columns();
    assert_eq!(column_names(outcome.final_context()), vec!["a", "b", "z"]);
    assert_eq!(columns[0].data_type, Some(DataType::Integer));
    assert_eq!(columns[1].data_type, Some(DataType::Text));
    assert_eq!(columns[2].data_type, Some(DataType::Integer));

    let a = entry_named(&model, "a", 0);
    assert_eq!(model.symbols().entry_symbol(a).class(), SymbolClass::ColumnDerived);
    assert_eq!(
        model.symbols().resolve_definition(a),
        Some(SymbolDefinition::Column {
            table: "s".to_string(),
            column: "x".to_string(),
        })
    );
    assert_eq!(class_of(&model, "sx", 0), SymbolClass::TableAlias);
}

#[test]
fn test_alias_without_column_list() {
    // SELECT * FROM t AS t
    let mut sql = SqlTreeBuilder::new();
    let t = sql.table("t");
    let aliased = sql.aliased(t, "t", &[]);
    let root = sql.select_star(aliased);

    let (model, outcome) = analyze(&root);

    assert!(outcome.diagnostics().is_empty());
    let aliases: Vec<&str> = outcome
        .final_context()
        .aliases()
        .iter()
        .map(|a| a.name.as_str())
        .collect();
    assert_eq!(aliases, vec!["t"]);

    for column in outcome.final_context().columns() {
        assert_eq!(model.symbols().symbol(column.symbol).class(), SymbolClass::Column);
    }
    assert_eq!(class_of(&model, "t", 0), SymbolClass::TableName);
    assert_eq!(class_of(&model, "t", 1), SymbolClass::TableAlias);
}

#[test]
fn test_short_column_list_passes_remaining_columns() {
    // SELECT * FROM t AS t(x)
    let mut sql = SqlTreeBuilder::new();
    let t = sql.table("t");
    let aliased = sql.aliased(t, "t", &["x"]);
    let root = sql.select_star(aliased);

    let (_, outcome) = analyze(&root);

    assert!(outcome.diagnostics().is_empty());
    assert_eq!(column_names(outcome.final_context()), vec!["x", "name"]);
}

#[test]
fn test_base_table_column_list_depends_on_dialect() {
    // SELECT * FROM s AS sx(a, b), SELECT * FROM (SELECT * FROM s) AS d(a, b)
    let mut sql = SqlTreeBuilder::new();
    let s = sql.table("s");
    let aliased = sql.aliased(s, "sx", &["a", "b"]);
    let on_table = sql.select_star(aliased);

    let s = sql.table("s");
    let inner = sql.select_star(s);
    let subquery = sql.subquery(inner);
    let derived = sql.aliased(subquery, "d", &["a", "b"]);
    let on_subquery = sql.select_star(derived);

    let mysql = || AnalysisConfig::new(Dialect::MySQL);
    let (_, outcome) = analyze_with(&on_table, mysql());
    assert_eq!(diagnostic_kinds(&outcome), vec![DiagnosticKind::Unsupported]);
    assert_eq!(outcome.diagnostics()[0].severity, Severity::Warning);
    assert_eq!(column_names(outcome.final_context()), vec!["a", "b", "z"]);

    let (_, outcome) = analyze_with(&on_subquery, mysql());
    assert!(outcome.diagnostics().is_empty());
    assert_eq!(column_names(outcome.final_context()), vec!["a", "b", "z"]);
}

#[test]
fn test_excess_column_names_are_one_mismatch() {
    // SELECT * FROM t AS t(a, b, c, d)
    let mut sql = SqlTreeBuilder::new();
    let t = sql.table("t");
    let aliased = sql.aliased(t, "t", &["a", "b", "c", "d"]);
    let root = sql.select_star(aliased);

    let (model, outcome) = analyze(&root);

    assert_eq!(diagnostic_kinds(&outcome), vec![DiagnosticKind::CorrelationCountMismatch]);
    assert_eq!(
        outcome.diagnostics()[0].error,
        SemanticError::CorrelationCountMismatch { names: 4, columns: 2 }
    );
    assert_eq!(column_names(outcome.final_context()), vec!["a", "b"]);
    assert_eq!(class_of(&model, "c", 0), SymbolClass::Error);
    assert_eq!(class_of(&model, "d", 0), SymbolClass::Error);
    assert_eq!(class_of(&model, "a", 0), SymbolClass::ColumnDerived);
}

#[test]
fn test_unknown_table() {
    // SELECT * FROM ghosts
    let mut sql = SqlTreeBuilder::new();
    let ghosts = sql.table("ghosts");
    let root = sql.select_star(ghosts);

    let (model, outcome) = analyze(&root);

    assert_eq!(diagnostic_kinds(&outcome), vec![DiagnosticKind::UnknownTable]);
    let diagnostic = &outcome.diagnostics()[0];
    assert_eq!(diagnostic.code, "QM-005");
    assert_eq!(diagnostic.severity, Severity::Error);
    assert_eq!(class_of(&model, "ghosts", 0), SymbolClass::Error);
    assert!(outcome.final_context().columns().is_empty());
    assert_eq!(outcome.stats().get("catalog.miss"), Some(&1));
}

#[test]
fn test_broken_table_suppresses_qualified_column_errors() {
    // SELECT ghosts.a FROM ghosts
    let mut sql = SqlTreeBuilder::new();
    let ghosts = sql.table("ghosts");
    let a = sql.col("ghosts.a");
    let root = sql.select(vec![a], vec![ghosts], None);

    let (_, outcome) = analyze(&root);

    assert_eq!(diagnostic_kinds(&outcome), vec![DiagnosticKind::UnknownTable]);
}

#[test]
fn test_schema_qualified_table() {
    // SELECT users.id FROM public.users
    let mut sql = SqlTreeBuilder::new();
    let users = sql.table("public.users");
    let id = sql.col("users.id");
    let root = sql.select(vec![id], vec![users], None);

    let analyzer = SemanticAnalyzer::new(AnalysisConfig::default());
    let mut model = analyzer.build(&&root);
    let outcome = analyzer
        .propagate(&mut model, &catalog(), &DataContext::empty(), None)
        .unwrap();

    assert!(outcome.diagnostics().is_empty());
    assert_eq!(column_names(outcome.final_context()), vec!["id"]);
    assert_eq!(model.referenced_tables(), vec!["public.users"]);
}

// ===== Projection =====

#[test]
fn test_projection_resolves_and_names_items() {
    // SELECT id, name AS label, 1 FROM t
    let mut sql = SqlTreeBuilder::new();
    let t = sql.table("t");
    let id = sql.col("id");
    let name = sql.col("name");
    let label = sql.item_as(name, "label");
    let one = sql.number("1");
    let root = sql.select(vec![id, label, one], vec![t], None);

    let (model, outcome) = analyze(&root);

    assert!(outcome.diagnostics().is_empty());
    let context = outcome.final_context();
    assert_eq!(column_names(context), vec!["id", "label", "?column?"]);
    assert_eq!(context.columns()[0].origin_table.as_deref(), Some("t"));
    assert_eq!(context.columns()[1].data_type, Some(DataType::Text));
    assert_eq!(context.columns()[2].data_type, Some(DataType::Integer));

    assert_eq!(class_of(&model, "id", 0), SymbolClass::Column);
    let label = entry_named(&model, "label", 0);
    assert_eq!(model.symbols().entry_symbol(label).class(), SymbolClass::ColumnDerived);
    assert_eq!(
        model.symbols().resolve_definition(label),
        Some(SymbolDefinition::Column {
            table: "t".to_string(),
            column: "name".to_string(),
        })
    );
}

#[test]
fn test_function_call_names_are_procedures() {
    // SELECT lower(name) AS low, upper(nope) FROM t
    let mut sql = SqlTreeBuilder::new();
    let t = sql.table("t");
    let name = sql.col("name");
    let lower = sql.call("lower", vec![name]);
    let low = sql.item_as(lower, "low");
    let nope = sql.col("nope");
    let upper = sql.call("upper", vec![nope]);
    let root = sql.select(vec![low, upper], vec![t], None);

    let (model, outcome) = analyze(&root);

    assert_eq!(diagnostic_kinds(&outcome), vec![DiagnosticKind::UnknownColumn]);
    assert_eq!(column_names(outcome.final_context()), vec!["low", "?column?"]);
    assert_eq!(class_of(&model, "lower", 0), SymbolClass::ProcedureName);
    assert_eq!(class_of(&model, "upper", 0), SymbolClass::ProcedureName);
    assert_eq!(class_of(&model, "name", 0), SymbolClass::Column);
    assert_eq!(class_of(&model, "nope", 0), SymbolClass::Error);
}

#[test]
fn test_unknown_column_still_yields_a_column() {
    // SELECT nope FROM t WHERE missing = 1
    let mut sql = SqlTreeBuilder::new();
    let t = sql.table("t");
    let missing = sql.col("missing");
    let one = sql.number("1");
    let filter = sql.binary(missing, "=", one);
    let nope = sql.col("nope");
    let root = sql.select(vec![nope], vec![t], Some(filter));

    let (model, outcome) = analyze(&root);

    // WHERE is resolved before the select list
    assert_eq!(
        outcome.diagnostics().iter().map(|d| d.error.clone()).collect::<Vec<_>>(),
        vec![
            SemanticError::UnknownColumn("missing".to_string()),
            SemanticError::UnknownColumn("nope".to_string()),
        ]
    );
    assert_eq!(column_names(outcome.final_context()), vec!["nope"]);
    assert_eq!(class_of(&model, "nope", 0), SymbolClass::Error);
}

#[test]
fn test_ambiguous_column() {
    // SELECT id FROM t CROSS JOIN users
    let mut sql = SqlTreeBuilder::new();
    let t = sql.table("t");
    let users = sql.table("users");
    let join = sql.join(t, "CROSS JOIN", users);
    let id = sql.col("id");
    let root = sql.select(vec![id], vec![join], None);

    let (model, outcome) = analyze(&root);

    assert_eq!(
        outcome.diagnostics()[0].error,
        SemanticError::AmbiguousColumn("id".to_string(), vec!["t".to_string(), "users".to_string()])
    );
    assert_eq!(class_of(&model, "id", 0), SymbolClass::Ambiguous);
}

#[test]
fn test_qualified_wildcard_expands_one_source() {
    // SELECT u.* FROM users AS u JOIN orders AS o ON u.id = o.user_id
    let mut sql = SqlTreeBuilder::new();
    let users = sql.table("users");
    let u = sql.aliased(users, "u", &[]);
    let orders = sql.table("orders");
    let o = sql.aliased(orders, "o", &[]);
    let left = sql.col("u.id");
    let right = sql.col("o.user_id");
    let on = sql.binary(left, "=", right);
    let join = sql.join_on(u, "JOIN", o, on);
    let star = sql.star_of("u");
    let root = sql.select(vec![star], vec![join], None);

    let (model, outcome) = analyze(&root);

    assert!(outcome.diagnostics().is_empty());
    assert_eq!(column_names(outcome.final_context()), vec!["id", "email"]);

    // both qualifiers resolve to their alias symbols
    let u_alias = entry_named(&model, "u", 0);
    let u_use = entry_named(&model, "u", 1);
    assert_eq!(
        model.symbols().entry(u_use).symbol(),
        model.symbols().entry(u_alias).symbol()
    );
}

#[test]
fn test_unresolved_qualifier() {
    // SELECT x.* FROM t
    let mut sql = SqlTreeBuilder::new();
    let t = sql.table("t");
    let star = sql.star_of("x");
    let root = sql.select(vec![star], vec![t], None);

    let (model, outcome) = analyze(&root);

    assert_eq!(
        outcome.diagnostics()[0].error,
        SemanticError::UnresolvedAlias("x".to_string())
    );
    assert_eq!(class_of(&model, "x", 0), SymbolClass::Error);
    assert!(outcome.final_context().columns().is_empty());
}

#[test]
fn test_case_sensitive_configuration() {
    // SELECT ID FROM t
    let mut sql = SqlTreeBuilder::new();
    let t = sql.table("t");
    let id = sql.col("ID");
    let root = sql.select(vec![id], vec![t], None);

    let (_, relaxed) = analyze(&root);
    assert!(relaxed.diagnostics().is_empty());

    let strict = AnalysisConfig::from_yaml(SchemaFixtures::strict_config_yaml()).unwrap();
    let (_, outcome) = analyze_with(&root, strict);
    assert_eq!(diagnostic_kinds(&outcome), vec![DiagnosticKind::UnknownColumn]);
}

#[test]
fn test_quoted_identifier_is_exact() {
    // SELECT "ID", "id" FROM t
    let mut sql = SqlTreeBuilder::new();
    let t = sql.table("t");
    let upper = sql.col("\"ID\"");
    let lower = sql.col("\"id\"");
    let root = sql.select(vec![upper, lower], vec![t], None);

    let (_, outcome) = analyze(&root);

    assert_eq!(
        outcome.diagnostics().iter().map(|d| d.error.clone()).collect::<Vec<_>>(),
        vec![SemanticError::UnknownColumn("ID".to_string())]
    );
}

// ===== Set operations =====

#[test]
fn test_union_width_mismatch_keeps_first_operand() {
    // SELECT * FROM s UNION SELECT * FROM t
    let mut sql = SqlTreeBuilder::new();
    let s = sql.table("s");
    let left = sql.select_star(s);
    let t = sql.table("t");
    let right = sql.select_star(t);
    let root = sql.union(left, right);

    let (_, outcome) = analyze(&root);

    assert_eq!(
        outcome.diagnostics()[0].error,
        SemanticError::ShapeMismatch {
            expected: 3,
            found: 2,
            operand: 2,
        }
    );
    assert_eq!(outcome.diagnostics()[0].severity, Severity::Warning);
    assert!(!outcome.has_errors());
    assert_eq!(column_names(outcome.final_context()), vec!["x", "y", "z"]);
}

#[test]
fn test_union_columns_belong_to_the_set_operation() {
    // SELECT * FROM t UNION SELECT * FROM t
    let mut sql = SqlTreeBuilder::new();
    let first = sql.table("t");
    let left = sql.select_star(first);
    let second = sql.table("t");
    let right = sql.select_star(second);
    let root = sql.union(left, right);

    let (model, outcome) = analyze(&root);

    assert!(outcome.diagnostics().is_empty());
    assert_eq!(column_names(outcome.final_context()), vec!["id", "name"]);
    for column in outcome.final_context().columns() {
        assert_eq!(column.source, model.root().id());
        assert!(column.origin_table.is_none());
        assert!(column.origin_column.is_none());
        assert_eq!(outcome.source_node(&model, column).unwrap().kind_name(), "set-operation");
    }
    assert_eq!(outcome.final_context().columns()[0].data_type, Some(DataType::Integer));
}

#[test]
fn test_union_type_conflict_clears_type() {
    // SELECT x, y FROM s UNION ALL SELECT name, id FROM t
    let mut sql = SqlTreeBuilder::new();
    let s = sql.table("s");
    let x = sql.col("x");
    let y = sql.col("y");
    let left = sql.select(vec![x, y], vec![s], None);
    let t = sql.table("t");
    let name = sql.col("name");
    let id = sql.col("id");
    let right = sql.select(vec![name, id], vec![t], None);
    let root = sql.set_operation(vec![left, right], &["UNION ALL"]);

    let (_, outcome) = analyze(&root);

    assert!(outcome.diagnostics().is_empty());
    let columns = outcome.final_context().columns();
    assert_eq!(column_names(outcome.final_context()), vec!["x", "y"]);
    assert!(columns.iter().all(|c| c.data_type.is_none()));
    assert_eq!(outcome.stats().get("set_operation.type_conflict"), Some(&2));
}

#[test]
fn test_three_operand_mismatch_names_the_operand() {
    // SELECT x FROM s UNION SELECT id FROM t EXCEPT SELECT id, name FROM t
    let mut sql = SqlTreeBuilder::new();
    let s = sql.table("s");
    let x = sql.col("x");
    let first = sql.select(vec![x], vec![s], None);
    let t = sql.table("t");
    let id = sql.col("id");
    let second = sql.select(vec![id], vec![t], None);
    let t = sql.table("t");
    let id = sql.col("id");
    let name = sql.col("name");
    let third = sql.select(vec![id, name], vec![t], None);
    let root = sql.set_operation(vec![first, second, third], &["UNION", "EXCEPT"]);

    let (_, outcome) = analyze(&root);

    assert_eq!(
        diagnostic_kinds(&outcome),
        vec![DiagnosticKind::ShapeMismatch]
    );
    assert!(matches!(
        outcome.diagnostics()[0].error,
        SemanticError::ShapeMismatch { operand: 3, .. }
    ));
}

// ===== VALUES =====

#[test]
fn test_values_columns_are_numbered() {
    // SELECT * FROM (VALUES (1, 'a'), (2, 'b')) AS v
    let mut sql = SqlTreeBuilder::new();
    let one = sql.number("1");
    let a = sql.string("'a'");
    let two = sql.number("2");
    let b = sql.string("'b'");
    let values = sql.values(vec![vec![one, a], vec![two, b]]);
    let aliased = sql.aliased(values, "v", &[]);
    let root = sql.select_star(aliased);

    let (_, outcome) = analyze(&root);

    assert!(outcome.diagnostics().is_empty());
    let columns = outcome.final_context().columns();
    assert_eq!(column_names(outcome.final_context()), vec!["column1", "column2"]);
    assert_eq!(columns[0].data_type, Some(DataType::Integer));
    assert_eq!(columns[1].data_type, Some(DataType::Text));
}

#[test]
fn test_values_renamed_and_ragged() {
    // SELECT * FROM (VALUES (1, 'a'), (2)) AS v(num, label)
    let mut sql = SqlTreeBuilder::new();
    let one = sql.number("1");
    let a = sql.string("'a'");
    let two = sql.number("2");
    let values = sql.values(vec![vec![one, a], vec![two]]);
    let aliased = sql.aliased(values, "v", &["num", "label"]);
    let root = sql.select_star(aliased);

    let (_, outcome) = analyze(&root);

    assert_eq!(
        outcome.diagnostics()[0].error,
        SemanticError::ShapeMismatch {
            expected: 2,
            found: 1,
            operand: 2,
        }
    );
    assert_eq!(column_names(outcome.final_context()), vec!["num", "label"]);
}

// ===== Malformed input and limits =====

#[test]
fn test_invalid_node_reports_malformed_tree() {
    // SELECT * FROM <garbage>
    let mut sql = SqlTreeBuilder::new();
    let garbage = sql.token("error", "???");
    let root = sql.select_star(garbage);

    let (_, outcome) = analyze(&root);

    assert_eq!(diagnostic_kinds(&outcome), vec![DiagnosticKind::MalformedTree]);
    assert_eq!(outcome.diagnostics()[0].code, "QM-008");
    assert!(outcome.final_context().columns().is_empty());
}

#[test]
fn test_recursion_limit() {
    // SELECT * FROM (SELECT * FROM t) AS q, with room for two levels
    let mut sql = SqlTreeBuilder::new();
    let t = sql.table("t");
    let inner = sql.select_star(t);
    let subquery = sql.subquery(inner);
    let aliased = sql.aliased(subquery, "q", &[]);
    let root = sql.select_star(aliased);

    let config = AnalysisConfig::new(Dialect::PostgreSQL).with_max_depth(2);
    let (_, outcome) = analyze_with(&root, config);

    assert_eq!(diagnostic_kinds(&outcome), vec![DiagnosticKind::RecursionLimit]);
    assert_eq!(outcome.diagnostics()[0].error, SemanticError::RecursionLimit { limit: 2 });
}

#[test]
fn test_deep_nesting_is_cut_off_while_building() {
    // SELECT * FROM (SELECT * FROM (... t ...) AS q1) AS q0, far past the limit
    let worker = std::thread::Builder::new()
        .stack_size(16 * 1024 * 1024)
        .spawn(|| {
            let mut sql = SqlTreeBuilder::new();
            let t = sql.table("t");
            let mut query = sql.select_star(t);
            for i in 0..1000 {
                let subquery = sql.subquery(query);
                let aliased = sql.aliased(subquery, &format!("q{}", i), &[]);
                query = sql.select_star(aliased);
            }

            let config = AnalysisConfig::default();
            let limit = config.max_depth;
            let (model, outcome) = analyze_with(&query, config);
            (model.node_count(), limit, diagnostic_kinds(&outcome))
        })
        .unwrap();

    let (nodes, limit, kinds) = worker.join().unwrap();
    assert!(nodes <= limit + 1, "{} nodes built for a limit of {}", nodes, limit);
    assert_eq!(kinds, vec![DiagnosticKind::RecursionLimit]);
}

#[test]
fn test_deep_expression_reports_recursion_limit() {
    // SELECT * FROM t WHERE id = 1 AND id = 1 AND ... nested left-deep
    let mut sql = SqlTreeBuilder::new();
    let t = sql.table("t");
    let id = sql.col("id");
    let one = sql.number("1");
    let mut filter = sql.binary(id, "=", one);
    for _ in 0..10 {
        let id = sql.col("id");
        filter = sql.binary(filter, "AND", id);
    }
    let star = sql.star();
    let root = sql.select(vec![star], vec![t], Some(filter));

    let config = AnalysisConfig::new(Dialect::PostgreSQL).with_max_depth(4);
    let (_, outcome) = analyze_with(&root, config);

    let kinds = diagnostic_kinds(&outcome);
    assert!(!kinds.is_empty());
    assert!(kinds.iter().all(|k| *k == DiagnosticKind::RecursionLimit));
    assert_eq!(column_names(outcome.final_context()), vec!["id", "name"]);
}

#[test]
fn test_diagnostics_serialize() {
    let mut sql = SqlTreeBuilder::new();
    let ghosts = sql.table("ghosts");
    let root = sql.select_star(ghosts);

    let (_, outcome) = analyze(&root);

    let json = serde_json::to_value(&outcome.diagnostics()[0]).unwrap();
    assert_eq!(json["code"], "QM-005");
    assert_eq!(json["severity"], "Error");
    assert_eq!(json["kind"], "UnknownTable");
}

// ===== Re-propagation =====

#[test]
fn test_second_pass_is_identical() {
    // SELECT sx.a, t.name FROM s AS sx(a, b, c, d) JOIN t ON sx.a = t.id
    // plus an unknown column to exercise error classification
    let mut sql = SqlTreeBuilder::new();
    let s = sql.table("s");
    let sx = sql.aliased(s, "sx", &["a", "b", "c", "d"]);
    let t = sql.table("t");
    let left = sql.col("sx.a");
    let right = sql.col("t.id");
    let on = sql.binary(left, "=", right);
    let join = sql.join_on(sx, "JOIN", t, on);
    let a = sql.col("sx.a");
    let name = sql.col("t.name");
    let nope = sql.col("nope");
    let root = sql.select(vec![a, name, nope], vec![join], None);

    let analyzer = SemanticAnalyzer::new(AnalysisConfig::default());
    let mut model = analyzer.build(&&root);
    let lookup = catalog();

    let first = analyzer
        .propagate(&mut model, &lookup, &DataContext::empty(), None)
        .unwrap();
    let symbols_after_first = model.symbols().clone();
    let second = analyzer
        .propagate(&mut model, &lookup, &DataContext::empty(), None)
        .unwrap();

    assert_eq!(first.final_context(), second.final_context());
    assert_eq!(first.diagnostics(), second.diagnostics());
    assert_eq!(&symbols_after_first, model.symbols());
    assert_eq!(column_names(second.final_context()), vec!["a", "name", "nope"]);
}
