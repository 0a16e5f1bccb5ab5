//! Tests for pagination module

use super::*;
use crate::cursor::{self, CursorValues};
use crate::error::{Error, Result};
use crate::metadata::{ErrorCode, Metadata};
use crate::optimizer::QueryOptimizer;
use crate::types::{Comparison, JsonValue, SortDirection};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::cell::Cell;
use std::cmp::Ordering;
use std::time::Duration;

/// In-memory query source over JSON rows
#[derive(Debug, Default)]
struct MemorySource {
    rows: Vec<JsonValue>,
    fields: Vec<String>,
    order: Option<(String, SortDirection)>,
    filters: Vec<(String, Comparison, JsonValue)>,
    offset: i64,
    limit: Option<i64>,
    hints: Vec<String>,
    batch: Option<usize>,
    timeout: Option<Duration>,
    fetches: Cell<usize>,
    fail_count: bool,
    fail_fetch: bool,
}

impl MemorySource {
    fn users() -> Self {
        let names = ["alice", "bob", "carol", "dave", "erin"];
        Self {
            rows: names
                .iter()
                .enumerate()
                .map(|(i, name)| json!({"id": i as i64 + 1, "name": name, "age": 20 + i as i64 * 5}))
                .collect(),
            ..Default::default()
        }
    }

    fn matches(&self, row: &JsonValue) -> bool {
        self.filters.iter().all(|(field, comparison, value)| {
            let ord = compare(&row[field.as_str()], value);
            match comparison {
                Comparison::Gt => ord == Ordering::Greater,
                Comparison::Lt => ord == Ordering::Less,
                Comparison::Gte => ord != Ordering::Less,
                Comparison::Lte => ord != Ordering::Greater,
                Comparison::Eq => ord == Ordering::Equal,
            }
        })
    }
}

fn compare(a: &JsonValue, b: &JsonValue) -> Ordering {
    match (a.as_i64(), b.as_i64()) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => a.as_str().unwrap_or_default().cmp(b.as_str().unwrap_or_default()),
    }
}

impl CountSource for MemorySource {
    fn count(&self) -> Result<i64> {
        if self.fail_count {
            return Err(Error::data_source("count timed out"));
        }
        Ok(self.rows.iter().filter(|r| self.matches(r)).count() as i64)
    }
}

impl QuerySource for MemorySource {
    type Row = JsonValue;

    fn select(&mut self, fields: &[String]) {
        self.fields = fields.to_vec();
    }

    fn order_by(&mut self, field: &str, direction: SortDirection) {
        self.order = Some((field.to_string(), direction));
    }

    fn offset(&mut self, offset: i64) {
        self.offset = offset;
    }

    fn limit(&mut self, limit: i64) {
        self.limit = Some(limit);
    }

    fn filter(&mut self, field: &str, comparison: Comparison, value: &JsonValue) {
        self.filters
            .push((field.to_string(), comparison, value.clone()));
    }

    fn fetch(&self) -> Result<Vec<JsonValue>> {
        if self.fail_fetch {
            return Err(Error::data_source("connection reset"));
        }
        self.fetches.set(self.fetches.get() + 1);
        let mut rows: Vec<JsonValue> = self
            .rows
            .iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect();
        if let Some((field, direction)) = &self.order {
            rows.sort_by(|a, b| {
                let ord = compare(&a[field.as_str()], &b[field.as_str()]);
                match direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            });
        }
        let limit = self.limit.map_or(usize::MAX, |l| l as usize);
        Ok(rows
            .into_iter()
            .skip(self.offset as usize)
            .take(limit)
            .map(|row| {
                if self.fields.is_empty() {
                    return row;
                }
                let projected = self
                    .fields
                    .iter()
                    .map(|f| (f.clone(), row[f.as_str()].clone()))
                    .collect();
                JsonValue::Object(projected)
            })
            .collect())
    }

    fn to_sql(&self) -> String {
        format!(
            "memory order={:?} filters={} offset={} limit={:?}",
            self.order,
            self.filters.len(),
            self.offset,
            self.limit
        )
    }

    fn index_hint(&mut self, index: &str) {
        self.hints.push(index.to_string());
    }

    fn batch_size(&mut self, size: usize) {
        self.batch = Some(size);
    }

    fn timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }
}

struct FixedCount(i64);

impl CountSource for FixedCount {
    fn count(&self) -> Result<i64> {
        Ok(self.0)
    }
}

fn ids(rows: &[JsonValue]) -> Vec<i64> {
    rows.iter().filter_map(|r| r["id"].as_i64()).collect()
}

// ============================================================================
// Offset Mode
// ============================================================================

#[test]
fn test_offset_last_partial_page() {
    let mut source = MemorySource::users();
    let mut m = Metadata::new().with_page(2).with_page_size(3).with_sort("id");

    let page = paginate(&mut source, &mut m).unwrap();

    assert_eq!(ids(&page.rows), vec![4, 5]);
    assert_eq!(m.total_rows, 5);
    assert_eq!(m.total_pages, 2);
    assert_eq!((m.from_row, m.to_row), (4, 5));
    assert!(m.has_previous);
    assert!(!m.has_next);
    assert!(!page.has_more);
    assert_eq!(page.next_cursor, None);
}

#[test]
fn test_offset_sort_descending() {
    let mut source = MemorySource::users();
    let mut m = Metadata::new()
        .with_page_size(2)
        .with_sort("name")
        .with_sort_direction("desc");

    let page = paginate(&mut source, &mut m).unwrap();

    assert_eq!(ids(&page.rows), vec![5, 4]);
    assert!(page.has_more);
    assert_eq!(source.offset, 0);
    assert_eq!(source.limit, Some(2));
}

#[test]
fn test_offset_without_sort_leaves_order_alone() {
    let mut source = MemorySource::users();
    let mut m = Metadata::new();

    paginate(&mut source, &mut m).unwrap();
    assert_eq!(source.order, None);
}

#[test]
fn test_field_selection() {
    let mut source = MemorySource::users();
    let mut m = Metadata::new().with_fields(["id", "name"]).with_sort("id");

    let page = paginate(&mut source, &mut m).unwrap();

    assert_eq!(page.rows[0], json!({"id": 1, "name": "alice"}));
    assert_eq!(source.fields, vec!["id".to_string(), "name".to_string()]);
}

#[test]
fn test_star_projection_is_not_applied() {
    let mut source = MemorySource::users();
    let mut m = Metadata::new().with_fields(["*", "id"]);

    paginate(&mut source, &mut m).unwrap();
    assert!(source.fields.is_empty());
}

#[test]
fn test_unsafe_selected_field_is_rejected() {
    let mut source = MemorySource::users();
    let mut m = Metadata::new().with_fields(["id", "name FROM secrets --"]);

    let err = paginate(&mut source, &mut m).unwrap_err();
    assert!(matches!(err, Error::UnsafeIdentifier { .. }));
    assert_eq!(source.fetches.get(), 0);
}

// ============================================================================
// Cursor Mode
// ============================================================================

#[test]
fn test_cursor_first_page_issues_next_cursor() {
    let mut source = MemorySource::users();
    let mut m = Metadata::new().with_cursor_field("id").with_page_size(2);

    let page = paginate(&mut source, &mut m).unwrap();

    assert_eq!(ids(&page.rows), vec![1, 2]);
    assert!(source.filters.is_empty());
    let next = page.next_cursor.clone().unwrap();
    assert_eq!(cursor::decode(&next).unwrap(), r#"{"id":2,"page":1}"#);
    assert_eq!(m.cursor, next);
    assert!(page.has_more);
}

#[test]
fn test_cursor_traversal_visits_every_row_once() {
    let mut seen = Vec::new();
    let mut m = Metadata::new()
        .with_cursor_field("id")
        .with_cursor_order("asc")
        .with_page_size(2);

    loop {
        let mut source = MemorySource::users();
        let page = paginate(&mut source, &mut m).unwrap();
        seen.extend(ids(&page.rows));
        if !page.has_more {
            break;
        }
        m.page += 1;
    }

    assert_eq!(seen, vec![1, 2, 3, 4, 5]);
    assert_eq!(m.page, 3);
}

#[test]
fn test_cursor_descending_filters_below_value() {
    let mut source = MemorySource::users();
    let token = cursor::encode(&CursorValues::new().with("id", 3));
    let mut m = Metadata::new()
        .with_cursor(token)
        .with_cursor_field("id")
        .with_cursor_order("desc");

    let page = paginate(&mut source, &mut m).unwrap();

    assert_eq!(ids(&page.rows), vec![2, 1]);
    assert_eq!(
        source.filters,
        vec![("id".to_string(), Comparison::Lt, json!(3))]
    );
}

#[test]
fn test_invalid_cursor_is_ignored_by_default() {
    let mut source = MemorySource::users();
    let mut m = Metadata::new()
        .with_cursor("!!not-base64!!")
        .with_cursor_field("id")
        .with_page_size(2);

    let page = paginate(&mut source, &mut m).unwrap();

    assert_eq!(ids(&page.rows), vec![1, 2]);
    assert!(source.filters.is_empty());
    assert_eq!(source.order, Some(("id".to_string(), SortDirection::Asc)));
    assert_eq!(source.limit, Some(2));
}

#[test]
fn test_invalid_cursor_rejected_by_policy() {
    let mut source = MemorySource::users();
    let mut m = Metadata::new()
        .with_cursor("!!not-base64!!")
        .with_cursor_field("id");

    let mut paginator =
        Paginator::new(&mut source, &mut m).on_invalid_cursor(InvalidCursorPolicy::Reject);
    paginator.validate().unwrap();
    paginator.count().unwrap();
    let err = paginator.fetch().unwrap_err();

    assert!(matches!(err, Error::InvalidCursor { .. }));
    assert_eq!(paginator.stage(), Stage::Failed);
}

#[test]
fn test_no_next_cursor_when_cursor_field_is_projected_away() {
    let mut source = MemorySource::users();
    let mut m = Metadata::new()
        .with_cursor_field("age")
        .with_fields(["id", "name"])
        .with_page_size(2);

    let page = paginate(&mut source, &mut m).unwrap();

    assert_eq!(page.len(), 2);
    assert_eq!(page.next_cursor, None);
    assert!(page.has_more);
}

#[test]
fn test_next_cursor_reads_qualified_field_by_column_name() {
    let row = json!({"id": 7, "created_at": "2024-01-05"});
    let m = Metadata::new()
        .with_cursor_field("users.created_at")
        .with_page(2);

    let next = CursorStrategy::default().next_cursor(&row, &m).unwrap();

    assert_eq!(
        cursor::decode(&next).unwrap(),
        r#"{"users.created_at":"2024-01-05","id":7,"page":2}"#
    );
}

#[test]
fn test_cursor_page_shape() {
    let mut source = MemorySource::users();
    let mut m = Metadata::new().with_cursor_field("id").with_page_size(4);

    let page = paginate(&mut source, &mut m).unwrap().into_cursor_page();

    assert_eq!(page.data.len(), 4);
    assert!(page.has_more);
    assert!(page.next_cursor.is_some());
    assert_eq!(page.prev_cursor, None);
}

// ============================================================================
// Driver Stages
// ============================================================================

#[test]
fn test_invalid_metadata_fails_before_counting() {
    let mut source = MemorySource::users();
    let mut m = Metadata::new().with_page(0).with_cursor("abc");

    let err = paginate(&mut source, &mut m).unwrap_err();

    let codes: Vec<ErrorCode> = err.violations().iter().map(|v| v.code).collect();
    assert_eq!(
        codes,
        vec![ErrorCode::InvalidPage, ErrorCode::MissingCursorField]
    );
    assert_eq!(m.total_rows, 0);
}

#[test]
fn test_steps_out_of_order() {
    let mut source = MemorySource::users();
    let mut m = Metadata::new();
    let mut paginator = Paginator::new(&mut source, &mut m);

    let err = paginator.fetch().unwrap_err();
    assert!(matches!(err, Error::Stage { step: "fetch", .. }));
    assert_eq!(paginator.stage(), Stage::Start);

    paginator.validate().unwrap();
    assert!(paginator.validate().is_err());
    assert_eq!(paginator.stage(), Stage::Validated);
}

#[test]
fn test_failed_count_is_terminal() {
    let mut source = MemorySource {
        fail_count: true,
        ..MemorySource::users()
    };
    let mut m = Metadata::new();
    let mut paginator = Paginator::new(&mut source, &mut m);

    paginator.validate().unwrap();
    assert!(paginator.count().unwrap_err().is_data_source());
    assert_eq!(paginator.stage(), Stage::Failed);
    assert!(matches!(
        paginator.fetch().unwrap_err(),
        Error::Stage { .. }
    ));
}

#[test]
fn test_fetch_error_propagates() {
    let mut source = MemorySource {
        fail_fetch: true,
        ..MemorySource::users()
    };
    let mut m = Metadata::new();

    let err = paginate(&mut source, &mut m).unwrap_err();
    assert!(err.is_data_source());
}

#[test]
fn test_step_by_step_run() {
    let mut source = MemorySource::users();
    let mut m = Metadata::new().with_page_size(2).with_sort("id");
    let mut paginator = Paginator::new(&mut source, &mut m);

    paginator.validate().unwrap();
    assert_eq!(paginator.count().unwrap(), 5);
    assert_eq!(paginator.fetch().unwrap(), 2);
    let page = paginator.finalize().unwrap();

    assert_eq!(paginator.stage(), Stage::Finalized);
    assert_eq!(paginator.metadata().total_pages, 3);
    assert_eq!(ids(&page.rows), vec![1, 2]);
}

#[test]
fn test_paginate_with_alternate_count() {
    let mut source = MemorySource::users();
    let mut m = Metadata::new().with_page_size(2);

    let page = paginate_with_count(&mut source, &FixedCount(42), &mut m).unwrap();

    assert_eq!(m.total_rows, 42);
    assert_eq!(m.total_pages, 21);
    assert!(page.has_more);
}

#[test]
fn test_debug_records_trace() {
    let mut source = MemorySource::users();
    let mut m = Metadata::new().with_debug(true);

    let page = paginate(&mut source, &mut m).unwrap();

    let trace = page.trace.unwrap();
    assert!(trace.sql.starts_with("memory"));
}

#[test]
fn test_no_trace_without_debug() {
    let mut source = MemorySource::users();
    let mut m = Metadata::new();

    let page = paginate(&mut source, &mut m).unwrap();
    assert_eq!(page.trace, None);
}

#[test]
fn test_optimized_paginate_applies_hints() {
    let mut source = MemorySource::users();
    let mut m = Metadata::new().with_page_size(3);
    let optimizer = QueryOptimizer::builder()
        .batch_size(250)
        .timeout(Duration::from_secs(5))
        .build();

    let page = optimized_paginate(&mut source, &mut m, &optimizer).unwrap();

    assert_eq!(source.hints, vec!["idx_created_at".to_string()]);
    assert_eq!(source.batch, Some(250));
    assert_eq!(source.timeout, Some(Duration::from_secs(5)));
    // the page limit replaces the optimizer's row cap
    assert_eq!(source.limit, Some(3));
    assert_eq!(page.len(), 3);
}
