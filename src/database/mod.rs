//! DuckDB implementations of the query seams
//!
//! [`DuckDbQuery`] is a [`QuerySource`](crate::pagination::QuerySource) over
//! one table, [`DuckDbExecutor`] a [`SqlExecutor`](crate::sql::SqlExecutor)
//! for raw queries. Rows come back as JSON objects keyed by column name.

mod query;
mod value;

pub use query::{open_connection, query_count, query_json, DuckDbExecutor, DuckDbQuery};
pub use value::{to_json, to_param};
