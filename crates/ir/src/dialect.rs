// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Dialect Support
//!
//! SQL dialects and the row-source features whose availability differs
//! between them.
//!
//! Grammar differences are the parser's business. The semantic layer only
//! needs to know which scoping constructs a dialect accepts:
//!
//! - **MySQL Family**: MySQL, TiDB, MariaDB
//! - **PostgreSQL Family**: PostgreSQL, CockroachDB

use serde::{Deserialize, Serialize};

/// Supported SQL dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Dialect {
    /// MySQL (5.7, 8.0)
    MySQL,
    /// PostgreSQL (12, 14, 15+)
    #[default]
    PostgreSQL,
    /// TiDB (5.0, 6.0, 7.0, 8.0)
    TiDB,
    /// MariaDB (10.x, 11.x)
    MariaDB,
    /// CockroachDB (21.x, 22.x, 23.x)
    CockroachDB,
}

impl Dialect {
    /// Returns the family this dialect belongs to
    pub fn family(&self) -> DialectFamily {
        match self {
            Dialect::MySQL | Dialect::TiDB | Dialect::MariaDB => DialectFamily::MySQL,
            Dialect::PostgreSQL | Dialect::CockroachDB => DialectFamily::PostgreSQL,
        }
    }

    /// Check if this dialect supports a specific extension
    pub fn supports(&self, ext: DialectExtensions) -> bool {
        match self.family() {
            DialectFamily::PostgreSQL => matches!(
                ext,
                DialectExtensions::LateralJoin
                    | DialectExtensions::FullOuterJoin
                    | DialectExtensions::TableColumnAliases
            ),
            // MySQL 8.0 accepts LATERAL derived tables, MariaDB does not
            DialectFamily::MySQL => {
                matches!(ext, DialectExtensions::LateralJoin) && *self == Dialect::MySQL
            }
        }
    }

    /// Human-readable dialect name
    pub fn name(&self) -> &'static str {
        match self {
            Dialect::MySQL => "MySQL",
            Dialect::PostgreSQL => "PostgreSQL",
            Dialect::TiDB => "TiDB",
            Dialect::MariaDB => "MariaDB",
            Dialect::CockroachDB => "CockroachDB",
        }
    }
}

/// Dialect family groupings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DialectFamily {
    MySQL,
    PostgreSQL,
}

/// Row-source features that are not available everywhere
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum DialectExtensions {
    /// `LATERAL` subqueries that see preceding FROM items
    LateralJoin,

    /// FULL OUTER JOIN
    FullOuterJoin,

    /// Column alias lists on base tables: `users AS u(a, b)`
    TableColumnAliases,
}
