// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Test fixtures: schema documents and analysis configurations

/// Sample schema and configuration documents for testing
pub struct SchemaFixtures;

impl SchemaFixtures {
    // ===== Schemas =====

    /// `s(x, y, z)` and `t(id, name)`, the tables used by correlation tests
    pub const fn correlation_yaml() -> &'static str {
        r#"
schema: public
tables:
  - name: s
    columns:
      - { name: x, type: Integer }
      - { name: y, type: Text }
      - { name: z, type: Integer }
  - name: t
    columns:
      - { name: id, type: Integer, primary_key: true }
      - { name: name, type: Text, nullable: true }
"#
    }

    /// A small shop: `users`, `orders`, `products`
    pub const fn shop_json() -> &'static str {
        r#"{
  "schema": "shop",
  "tables": [
    {
      "name": "users",
      "columns": [
        { "name": "id", "type": "BigInt", "primary_key": true },
        { "name": "email", "type": "Text" },
        { "name": "name", "type": "Text", "nullable": true }
      ]
    },
    {
      "name": "orders",
      "columns": [
        { "name": "id", "type": "BigInt", "primary_key": true },
        { "name": "user_id", "type": "BigInt" },
        { "name": "total", "type": "Decimal", "nullable": true }
      ]
    },
    {
      "name": "products",
      "columns": [
        { "name": "id", "type": "BigInt", "primary_key": true },
        { "name": "name", "type": "Text" },
        { "name": "price", "type": "Decimal" }
      ]
    }
  ]
}"#
    }

    // ===== Analysis configuration =====

    /// MySQL, case-sensitive names, shallow recursion limit
    pub const fn strict_config_yaml() -> &'static str {
        "dialect: MySQL\ncase_sensitive: true\nmax_depth: 8\n"
    }
}
