//! Pagination metadata
//!
//! Raw request parameters plus the fields derived from them once the
//! total row count is known.

use crate::types::{PaginationMode, SortDirection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default page size applied when the requested size is below 1
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Largest page size a request may ask for
pub const MAX_PAGE_SIZE: i64 = 100;

/// Wildcard selecting every field
pub const ALL_FIELDS: &str = "*";

/// Pagination, sorting and cursor state for a single request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    /// Current page (1-based)
    pub page: i64,

    /// Capacity of a page
    pub page_size: i64,

    /// Sort field
    pub sort: String,

    /// Raw sort direction as supplied by the caller
    pub sort_direction: String,

    /// Opaque cursor token
    pub cursor: String,

    /// Field the cursor is positioned on
    pub cursor_field: String,

    /// Raw cursor direction
    pub cursor_order: String,

    /// Fields to select, in request order
    #[serde(rename = "fields")]
    pub selected_fields: Vec<String>,

    /// Number of rows in the whole result set
    pub total_rows: i64,

    /// Number of pages, derived from total rows and page size
    pub total_pages: i64,

    pub has_next: bool,

    pub has_previous: bool,

    /// First row (1-based) on the current page
    pub from_row: i64,

    /// Last row (1-based, inclusive) on the current page
    pub to_row: i64,

    /// Declarative rules keyed by target field (`page_size`, `sort`, `fields`)
    #[serde(skip_serializing)]
    pub validation_rules: BTreeMap<String, String>,

    /// Record issued SQL and timings while paginating
    #[serde(skip_serializing)]
    pub debug: bool,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort: String::new(),
            sort_direction: SortDirection::Asc.as_str().to_string(),
            cursor: String::new(),
            cursor_field: String::new(),
            cursor_order: String::new(),
            selected_fields: Vec::new(),
            total_rows: 0,
            total_pages: 0,
            has_next: false,
            has_previous: false,
            from_row: 0,
            to_row: 0,
            validation_rules: BTreeMap::new(),
            debug: false,
        }
    }
}

impl Metadata {
    /// Create metadata with default values (page 1, 10 per page, ascending)
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_page(mut self, page: i64) -> Self {
        self.page = page;
        self
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: i64) -> Self {
        self.page_size = page_size;
        self
    }

    #[must_use]
    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = sort.into();
        self
    }

    #[must_use]
    pub fn with_sort_direction(mut self, direction: impl Into<String>) -> Self {
        self.sort_direction = direction.into();
        self
    }

    #[must_use]
    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = cursor.into();
        self
    }

    #[must_use]
    pub fn with_cursor_field(mut self, field: impl Into<String>) -> Self {
        self.cursor_field = field.into();
        self
    }

    #[must_use]
    pub fn with_cursor_order(mut self, order: impl Into<String>) -> Self {
        self.cursor_order = order.into();
        self
    }

    /// Select a subset of fields. Repeated names are kept once, first occurrence wins.
    #[must_use]
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected_fields.clear();
        for field in fields {
            let field = field.into();
            if !self.selected_fields.contains(&field) {
                self.selected_fields.push(field);
            }
        }
        self
    }

    /// Attach a rule such as `max:50` or `in:name,email` to a target field
    #[must_use]
    pub fn with_validation_rule(
        mut self,
        field: impl Into<String>,
        rule: impl Into<String>,
    ) -> Self {
        self.validation_rules.insert(field.into(), rule.into());
        self
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set an externally known row count. Call [`Metadata::normalize`] to derive pages.
    #[must_use]
    pub fn with_total_rows(mut self, total_rows: i64) -> Self {
        self.total_rows = total_rows;
        self
    }

    /// Clamp raw parameters into range and recompute the derived fields.
    ///
    /// Idempotent. Derived fields are zeroed while `total_rows` is not positive.
    pub fn normalize(&mut self) {
        if self.page < 1 {
            self.page = 1;
        }

        if self.page_size < 1 {
            self.page_size = DEFAULT_PAGE_SIZE;
        } else if self.page_size > MAX_PAGE_SIZE {
            self.page_size = MAX_PAGE_SIZE;
        }

        if SortDirection::parse(&self.sort_direction).is_none() {
            self.sort_direction = SortDirection::Asc.as_str().to_string();
        }

        if !self.cursor_order.is_empty() && SortDirection::parse(&self.cursor_order).is_none() {
            self.cursor_order = SortDirection::Asc.as_str().to_string();
        }

        self.derive_range();
    }

    fn derive_range(&mut self) {
        if self.total_rows <= 0 {
            self.total_pages = 0;
            self.has_next = false;
            self.has_previous = false;
            self.from_row = 0;
            self.to_row = 0;
            return;
        }

        self.total_pages = total_pages(self.total_rows, self.page_size);
        self.has_next = self.page < self.total_pages;
        self.has_previous = self.page > 1;
        self.from_row = self.offset().saturating_add(1);
        self.to_row = self.page.saturating_mul(self.page_size).min(self.total_rows);
    }

    /// Rows to skip before the current page, saturating at `i64::MAX`
    pub fn offset(&self) -> i64 {
        (self.page - 1).max(0).saturating_mul(self.page_size)
    }

    /// Rows on the current page
    pub fn limit(&self) -> i64 {
        self.page_size
    }

    /// `"<field> <direction>"`, or empty when no sort field is set
    pub fn sort_clause(&self) -> String {
        if self.sort.is_empty() {
            return String::new();
        }
        format!("{} {}", self.sort, self.sort_direction)
    }

    /// Selected fields, or `["*"]` when none were chosen
    pub fn selected_fields(&self) -> Vec<String> {
        if self.selected_fields.is_empty() {
            vec![ALL_FIELDS.to_string()]
        } else {
            self.selected_fields.clone()
        }
    }

    /// Whether a projection narrower than `*` was requested
    pub fn has_projection(&self) -> bool {
        self.selected_fields
            .first()
            .is_some_and(|first| first != ALL_FIELDS)
    }

    /// Cursor mode is active when either a cursor or a cursor field is set
    pub fn is_cursor_based(&self) -> bool {
        !self.cursor.is_empty() || !self.cursor_field.is_empty()
    }

    pub fn mode(&self) -> PaginationMode {
        if self.is_cursor_based() {
            PaginationMode::Cursor
        } else {
            PaginationMode::Offset
        }
    }

    /// Parsed sort direction, ascending when unset or invalid
    pub fn direction(&self) -> SortDirection {
        SortDirection::parse(&self.sort_direction).unwrap_or_default()
    }

    /// Parsed cursor direction, ascending when unset or invalid
    pub fn cursor_direction(&self) -> SortDirection {
        SortDirection::parse(&self.cursor_order).unwrap_or_default()
    }
}

/// `ceil(total_rows / page_size)`, or 1 when the page size is not positive
pub fn total_pages(total_rows: i64, page_size: i64) -> i64 {
    if page_size <= 0 {
        return 1;
    }
    let pages = total_rows / page_size;
    if total_rows % page_size > 0 {
        pages + 1
    } else {
        pages
    }
}
