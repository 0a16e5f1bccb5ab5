//! Pagination types and traits
//!
//! Defines the query-execution seams the driver talks to and the values it
//! hands back.

use crate::error::Result;
use crate::types::{Comparison, JsonObject, JsonValue, SortDirection};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Counts the rows a query would return
pub trait CountSource {
    /// Number of rows matching the current filters, ignoring projection,
    /// ordering and limits
    fn count(&self) -> Result<i64>;
}

/// A mutable query the driver can shape and execute
pub trait QuerySource: CountSource {
    /// Materialized row type
    type Row;

    /// Restrict the projection
    fn select(&mut self, fields: &[String]);

    fn order_by(&mut self, field: &str, direction: SortDirection);

    fn offset(&mut self, offset: i64);

    /// Cap the number of rows. A later call replaces an earlier one.
    fn limit(&mut self, limit: i64);

    /// Add `field <comparison> value` to the filters
    fn filter(&mut self, field: &str, comparison: Comparison, value: &JsonValue);

    fn fetch(&self) -> Result<Vec<Self::Row>>;

    /// Statement text as it would be issued, for diagnostics
    fn to_sql(&self) -> String;

    /// Advisory index hint; sources without hint support ignore it
    fn index_hint(&mut self, _index: &str) {}

    /// Advisory statement timeout
    fn timeout(&mut self, _timeout: Duration) {}

    /// Advisory batch size for sources that stream rows
    fn batch_size(&mut self, _size: usize) {}
}

/// Read access to the values of a fetched row
pub trait CursorRow {
    fn value(&self, field: &str) -> Option<JsonValue>;
}

impl CursorRow for JsonObject {
    fn value(&self, field: &str) -> Option<JsonValue> {
        self.get(field).cloned()
    }
}

impl CursorRow for JsonValue {
    fn value(&self, field: &str) -> Option<JsonValue> {
        self.get(field).cloned()
    }
}

/// What the driver does with a cursor it cannot decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidCursorPolicy {
    /// Log a warning and fetch without the cursor filter
    #[default]
    Ignore,
    /// Fail with [`crate::Error::InvalidCursor`]
    Reject,
}

/// Progress of one pagination run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Validated,
    Counted,
    Paginated,
    Finalized,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::Validated => "validated",
            Stage::Counted => "counted",
            Stage::Paginated => "paginated",
            Stage::Finalized => "finalized",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Issued statement and wall time, recorded in debug mode
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryTrace {
    pub sql: String,
    #[serde(serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

fn serialize_millis<S: serde::Serializer>(
    elapsed: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u128(elapsed.as_millis())
}

/// Rows of one page plus what is needed to fetch the next one
#[derive(Debug, Clone, PartialEq)]
pub struct Page<R> {
    pub rows: Vec<R>,
    /// Cursor for the following page (cursor mode only)
    pub next_cursor: Option<String>,
    /// Whether another page follows, per the finalized metadata
    pub has_more: bool,
    pub trace: Option<QueryTrace>,
}

impl<R> Page<R> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Response shape with `data`, `next_cursor` and `has_more`
    pub fn into_cursor_page(self) -> crate::cursor::CursorPage<R> {
        let mut page = crate::cursor::CursorPage::new(self.rows);
        page.has_more = self.has_more;
        match self.next_cursor {
            Some(next) => page.with_next(next),
            None => page,
        }
    }
}
