// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Analysis configuration
//!
//! Loaded from JSON or YAML; every field is optional.
//!
//! ```yaml
//! dialect: MySQL
//! case_sensitive: false
//! max_depth: 64
//! ```

use serde::{Deserialize, Serialize};

use querymodel_ir::Dialect;

use crate::error::{SemanticError, SemanticResult};

/// Default nesting limit for a propagation pass
pub const DEFAULT_MAX_DEPTH: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Dialect used to gate dialect-specific constructs such as LATERAL
    pub dialect: Dialect,

    /// Compare unquoted identifiers exactly instead of ASCII case-insensitively
    pub case_sensitive: bool,

    /// Maximum row-source nesting depth
    pub max_depth: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            case_sensitive: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl AnalysisConfig {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Self::default()
        }
    }

    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn from_json(source: &str) -> SemanticResult<Self> {
        let config: Self =
            serde_json::from_str(source).map_err(|e| SemanticError::Config(e.to_string()))?;
        config.validate()
    }

    pub fn from_yaml(source: &str) -> SemanticResult<Self> {
        let config: Self =
            serde_yaml::from_str(source).map_err(|e| SemanticError::Config(e.to_string()))?;
        config.validate()
    }

    fn validate(self) -> SemanticResult<Self> {
        if self.max_depth == 0 {
            return Err(SemanticError::Config("max_depth must be at least 1".to_string()));
        }
        Ok(self)
    }

    /// Compare two identifiers
    ///
    /// Quoted identifiers on either side compare exactly.
    pub fn names_match(&self, a: &str, a_quoted: bool, b: &str, b_quoted: bool) -> bool {
        if self.case_sensitive || a_quoted || b_quoted {
            a == b
        } else {
            a.eq_ignore_ascii_case(b)
        }
    }
}
