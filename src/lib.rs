// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]

//! # metakit
//!
//! Pagination, sorting, field selection and cursor navigation for database
//! query results, plus light query-string optimization hints.
//!
//! ## Features
//!
//! - **Pagination metadata**: validate, clamp and derive page ranges
//! - **Two modes**: offset pagination and cursor (keyset) traversal
//! - **Cursor tokens**: opaque base64 tokens carrying the last seen values
//! - **Raw SQL**: dialect-aware paginated statements for MySQL, PostgreSQL, SQLite
//! - **Optimizer hints**: index hints, row caps, materialized prefixes
//! - **DuckDB**: ready-made query source and executor
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use metakit::database::DuckDbQuery;
//! use metakit::{paginate, Metadata, Result};
//!
//! fn first_page(conn: &duckdb::Connection) -> Result<()> {
//!     let mut metadata = Metadata::new()
//!         .with_page_size(20)
//!         .with_sort("created_at")
//!         .with_sort_direction("desc");
//!
//!     let mut users = DuckDbQuery::new(conn, "users")?;
//!     let page = paginate(&mut users, &mut metadata)?;
//!
//!     println!("{} of {} rows", page.len(), metadata.total_rows);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                 Metadata (validate / normalize)              │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │
//! ┌──────────────┬───────────────┴──────────┬────────────────────┐
//! │  Pagination  │        Raw SQL           │     Optimizer      │
//! ├──────────────┼──────────────────────────┼────────────────────┤
//! │ Offset       │ MySQL / PostgreSQL /     │ Index hints        │
//! │ Cursor       │ SQLite placeholders      │ Row cap            │
//! │ Paginator    │ Count + paginate         │ Materialized       │
//! └──────┬───────┴────────────┬─────────────┴────────────────────┘
//!        │  QuerySource       │  SqlExecutor
//! ┌──────┴────────────────────┴──────┐
//! │          DuckDB (or yours)       │
//! └──────────────────────────────────┘
//! ```

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Pagination metadata and validation
pub mod metadata;

/// Cursor tokens
pub mod cursor;

/// Pagination driver and query seams
pub mod pagination;

/// Raw SQL pagination
pub mod sql;

/// Query rewriting hints
pub mod optimizer;

/// YAML configuration
pub mod config;

/// DuckDB query source and executor
pub mod database;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result, ResultExt};
pub use types::*;

// Re-export commonly used types
pub use config::{load_config, load_config_from_str, MetakitConfig};
pub use cursor::{CursorPage, CursorValues};
pub use metadata::{ErrorCode, Metadata, ValidationError, ValidationResult};
pub use optimizer::QueryOptimizer;
pub use pagination::{
    optimized_paginate, paginate, paginate_with_count, CountSource, CursorRow,
    InvalidCursorPolicy, Page, Paginator, QuerySource,
};
pub use sql::{query_paginate, query_paginate_with_count, SqlExecutor};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
