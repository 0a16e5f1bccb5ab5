//! Pagination over raw SQL strings
//!
//! Builds a dialect-specific paginated statement around a caller query and
//! runs it through a [`SqlExecutor`].

use super::fragment::{KeysetCondition, PaginatedQuery};
use super::scan::has_keyword;
use crate::cursor;
use crate::error::{Error, Result};
use crate::metadata::Metadata;
use crate::types::{Dialect, JsonValue};
use std::time::Instant;
use tracing::{debug, info};

/// Executes parameterized SQL
pub trait SqlExecutor {
    /// Materialized result of a query
    type Rows;

    /// Run a query with positional parameters
    fn query(&self, sql: &str, params: &[JsonValue]) -> Result<Self::Rows>;

    /// Run a query whose first column of the first row is a row count
    fn query_count(&self, sql: &str, params: &[JsonValue]) -> Result<i64>;
}

/// `SELECT COUNT(*)` wrapper around a caller query
pub fn count_sql(query: &str) -> String {
    format!("SELECT COUNT(*) FROM ({}) AS counted", query.trim_end())
}

/// Build the paginated SQL and its parameters without executing anything.
///
/// In cursor mode a malformed cursor is an error.
pub fn build_paginated_sql(
    dialect: Dialect,
    query: &str,
    metadata: &Metadata,
    args: Vec<JsonValue>,
) -> Result<(String, Vec<JsonValue>)> {
    check_base_query(query, metadata)?;
    let mut statement = PaginatedQuery::new(query);

    if metadata.is_cursor_based() {
        let direction = metadata.cursor_direction();
        if !metadata.cursor.is_empty() {
            let payload = cursor::decode(&metadata.cursor)?;
            let value = cursor::comparison_value(&payload, &metadata.cursor_field)?;
            statement = statement.condition(KeysetCondition {
                field: metadata.cursor_field.clone(),
                comparison: direction.cursor_comparison(),
                value,
            })?;
        }
        statement = statement
            .order_by(&metadata.cursor_field, direction)?
            .limit(metadata.limit());
    } else {
        if !metadata.sort.is_empty() {
            statement = statement.order_by(&metadata.sort, metadata.direction())?;
        }
        statement = statement.limit(metadata.limit()).offset(metadata.offset());
    }

    Ok(statement.render(dialect, args))
}

/// Reject base queries whose own top-level clauses collide with the ones
/// appended for pagination. Wrap such a query in a subquery instead.
fn check_base_query(query: &str, metadata: &Metadata) -> Result<()> {
    if has_keyword(query, "LIMIT") || has_keyword(query, "FETCH") {
        return Err(Error::unsupported_query(
            "base query already limits its rows",
        ));
    }

    let ordered = metadata.is_cursor_based() || !metadata.sort.is_empty();
    if ordered && has_keyword(query, "ORDER") {
        return Err(Error::unsupported_query(
            "base query has its own ORDER BY while pagination sorts",
        ));
    }

    if metadata.is_cursor_based()
        && ["UNION", "INTERSECT", "EXCEPT"]
            .iter()
            .any(|op| has_keyword(query, op))
    {
        return Err(Error::unsupported_query(
            "keyset pagination over a set operation needs a subquery",
        ));
    }

    Ok(())
}

/// Paginate a raw query.
///
/// `metadata.total_rows` is taken as given, so derived fields are only as
/// good as the caller's count; use [`query_paginate_with_count`] to establish
/// it first. Unlike the query-source driver, a malformed cursor fails here.
pub fn query_paginate<E: SqlExecutor>(
    executor: &E,
    dialect: Dialect,
    query: &str,
    metadata: &mut Metadata,
    args: Vec<JsonValue>,
) -> Result<E::Rows> {
    let validation = metadata.validate();
    if !validation.is_valid {
        return Err(Error::invalid_metadata(validation.errors));
    }

    metadata.normalize();

    let started = Instant::now();
    let (sql, params) = build_paginated_sql(dialect, query, metadata, args)?;
    debug!(%dialect, sql = %sql, params = params.len(), "executing paginated query");

    let rows = executor.query(&sql, &params)?;

    if metadata.debug {
        info!(
            sql = %sql,
            elapsed = ?started.elapsed(),
            total_rows = metadata.total_rows,
            total_pages = metadata.total_pages,
            "paginated query finished"
        );
    }

    Ok(rows)
}

/// Count the caller query, then paginate it with an authoritative `total_rows`
pub fn query_paginate_with_count<E: SqlExecutor>(
    executor: &E,
    dialect: Dialect,
    query: &str,
    metadata: &mut Metadata,
    args: Vec<JsonValue>,
) -> Result<E::Rows> {
    let validation = metadata.validate();
    if !validation.is_valid {
        return Err(Error::invalid_metadata(validation.errors));
    }

    let count = count_sql(query);
    debug!(sql = %count, "counting rows");
    metadata.total_rows = executor.query_count(&count, &args)?;

    query_paginate(executor, dialect, query, metadata, args)
}
