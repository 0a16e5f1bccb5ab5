//! DuckDB-backed query source and SQL executor

use super::value::{to_json, to_param};
use crate::error::{Error, Result};
use crate::pagination::{CountSource, QuerySource};
use crate::sql::{check_identifier, SqlExecutor};
use crate::types::{Comparison, JsonObject, JsonValue, SortDirection};
use duckdb::{params_from_iter, Connection};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Open a DuckDB database file, or an in-memory database when `path` is `None`
pub fn open_connection(path: Option<&Path>) -> Result<Connection> {
    let conn = match path {
        Some(path) => Connection::open(path),
        None => Connection::open_in_memory(),
    };
    conn.map_err(|e| Error::config(format!("Failed to open DuckDB database: {e}")))
}

/// Run `sql` and materialize every row as a JSON object keyed by column name
pub fn query_json(conn: &Connection, sql: &str, params: &[JsonValue]) -> Result<Vec<JsonObject>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params_from_iter(params.iter().map(to_param)))?;
    let columns = rows
        .as_ref()
        .map(|stmt| stmt.column_names())
        .unwrap_or_default();

    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut object = JsonObject::new();
        for (idx, name) in columns.iter().enumerate() {
            let value: duckdb::types::Value = row.get(idx)?;
            object.insert(name.clone(), to_json(value));
        }
        out.push(object);
    }
    Ok(out)
}

/// Run a statement whose first column of the first row is a count
pub fn query_count(conn: &Connection, sql: &str, params: &[JsonValue]) -> Result<i64> {
    let count = conn.query_row(sql, params_from_iter(params.iter().map(to_param)), |row| {
        row.get::<_, i64>(0)
    })?;
    Ok(count)
}

// ============================================================================
// Query Source
// ============================================================================

/// One table on a DuckDB connection, shaped by the pagination driver
///
/// Filters added with [`with_filter`](Self::with_filter) belong to the caller
/// and also narrow the count; projection, ordering, offset and limit only
/// affect the fetch.
pub struct DuckDbQuery<'c> {
    conn: &'c Connection,
    table: String,
    fields: Vec<String>,
    filters: Vec<(String, Comparison, JsonValue)>,
    order: Option<(String, SortDirection)>,
    offset: Option<i64>,
    limit: Option<i64>,
}

impl<'c> DuckDbQuery<'c> {
    pub fn new(conn: &'c Connection, table: impl Into<String>) -> Result<Self> {
        let table = table.into();
        check_identifier(&table)?;
        Ok(Self {
            conn,
            table,
            fields: Vec::new(),
            filters: Vec::new(),
            order: None,
            offset: None,
            limit: None,
        })
    }

    /// Add a caller filter `field <comparison> value`
    pub fn with_filter(
        mut self,
        field: &str,
        comparison: Comparison,
        value: impl Into<JsonValue>,
    ) -> Result<Self> {
        check_identifier(field)?;
        self.filters
            .push((field.to_string(), comparison, value.into()));
        Ok(self)
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn where_clause(&self, sql: &mut String, params: &mut Vec<JsonValue>) -> Result<()> {
        for (idx, (field, comparison, value)) in self.filters.iter().enumerate() {
            check_identifier(field)?;
            sql.push_str(if idx == 0 { " WHERE " } else { " AND " });
            sql.push_str(&format!("{field} {comparison} ?"));
            params.push(value.clone());
        }
        Ok(())
    }

    /// Fetch statement and its parameters
    pub fn statement(&self) -> Result<(String, Vec<JsonValue>)> {
        let projection = if self.fields.is_empty() {
            "*".to_string()
        } else {
            for field in &self.fields {
                check_identifier(field)?;
            }
            self.fields.join(", ")
        };

        let mut sql = format!("SELECT {projection} FROM {}", self.table);
        let mut params = Vec::new();
        self.where_clause(&mut sql, &mut params)?;

        if let Some((field, direction)) = &self.order {
            check_identifier(field)?;
            sql.push_str(&format!(" ORDER BY {field} {direction}"));
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }
        Ok((sql, params))
    }

    /// Count statement and its parameters
    pub fn count_statement(&self) -> Result<(String, Vec<JsonValue>)> {
        let mut sql = format!("SELECT COUNT(*) FROM {}", self.table);
        let mut params = Vec::new();
        self.where_clause(&mut sql, &mut params)?;
        Ok((sql, params))
    }
}

impl CountSource for DuckDbQuery<'_> {
    fn count(&self) -> Result<i64> {
        let (sql, params) = self.count_statement()?;
        debug!(sql = %sql, "counting rows");
        query_count(self.conn, &sql, &params)
    }
}

impl QuerySource for DuckDbQuery<'_> {
    type Row = JsonObject;

    fn select(&mut self, fields: &[String]) {
        self.fields = fields.to_vec();
    }

    fn order_by(&mut self, field: &str, direction: SortDirection) {
        self.order = Some((field.to_string(), direction));
    }

    fn offset(&mut self, offset: i64) {
        self.offset = Some(offset);
    }

    fn limit(&mut self, limit: i64) {
        self.limit = Some(limit);
    }

    fn filter(&mut self, field: &str, comparison: Comparison, value: &JsonValue) {
        self.filters
            .push((field.to_string(), comparison, value.clone()));
    }

    fn fetch(&self) -> Result<Vec<JsonObject>> {
        let (sql, params) = self.statement()?;
        debug!(sql = %sql, params = params.len(), "fetching page");
        query_json(self.conn, &sql, &params)
    }

    fn to_sql(&self) -> String {
        self.statement()
            .map(|(sql, _)| sql)
            .unwrap_or_else(|e| format!("-- {e}"))
    }

    fn index_hint(&mut self, index: &str) {
        debug!(index, "DuckDB has no index hints; ignoring");
    }

    fn timeout(&mut self, timeout: Duration) {
        debug!(?timeout, "DuckDB statements are not interruptible here; ignoring timeout");
    }
}

// ============================================================================
// Raw SQL Executor
// ============================================================================

/// Raw SQL executor over a DuckDB connection
///
/// DuckDB accepts both `?` and `$n` placeholders, so queries rendered for any
/// dialect run unchanged.
#[derive(Clone, Copy)]
pub struct DuckDbExecutor<'c> {
    conn: &'c Connection,
}

impl<'c> DuckDbExecutor<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

impl SqlExecutor for DuckDbExecutor<'_> {
    type Rows = Vec<JsonObject>;

    fn query(&self, sql: &str, params: &[JsonValue]) -> Result<Vec<JsonObject>> {
        query_json(self.conn, sql, params)
    }

    fn query_count(&self, sql: &str, params: &[JsonValue]) -> Result<i64> {
        query_count(self.conn, sql, params)
    }
}
