//! Common types used throughout metakit
//!
//! This module contains shared type definitions, type aliases,
//! and the closed enumerations used across multiple modules.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type, used for materialized result rows
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// Sort Direction
// ============================================================================

/// Ordering direction for sort and cursor fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Parse a raw direction string. Only the exact lowercase forms are accepted.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    /// Lowercase SQL keyword for this direction
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    /// Keyset comparison operator that moves past a cursor in this direction
    pub fn cursor_comparison(&self) -> Comparison {
        match self {
            Self::Asc => Comparison::Gt,
            Self::Desc => Comparison::Lt,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Comparison
// ============================================================================

/// Comparison operator used in a where-condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Gt,
    Lt,
    Gte,
    Lte,
    Eq,
}

impl Comparison {
    /// SQL operator text
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Gte => ">=",
            Self::Lte => "<=",
            Self::Eq => "=",
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

// ============================================================================
// Dialect
// ============================================================================

/// Target SQL dialect
///
/// MySQL and SQLite bind parameters with `?`, PostgreSQL with numbered `$n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[serde(alias = "mariadb")]
    MySql,
    #[serde(alias = "postgres")]
    PostgreSql,
    Sqlite,
}

impl Dialect {
    /// Placeholder for the parameter at 1-based position `idx`
    pub fn placeholder(&self, idx: usize) -> String {
        match self {
            Self::PostgreSql => format!("${idx}"),
            Self::MySql | Self::Sqlite => "?".to_string(),
        }
    }

    /// Whether parameters bind by textual position (`?`) rather than by number
    pub fn is_positional(&self) -> bool {
        matches!(self, Self::MySql | Self::Sqlite)
    }

    /// Dialect name as used in configuration files
    pub fn name(&self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::PostgreSql => "postgresql",
            Self::Sqlite => "sqlite",
        }
    }
}

impl FromStr for Dialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Self::MySql),
            "postgres" | "postgresql" => Ok(Self::PostgreSql),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(Error::invalid_config(
                "dialect",
                format!("unknown dialect '{other}'"),
            )),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Pagination Mode
// ============================================================================

/// How a page is located in the underlying row set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationMode {
    /// Skip-count plus row limit
    Offset,
    /// Comparison against the last seen value of a stable ordering key
    Cursor,
}
