//! Cursor page response shape

use serde::{Deserialize, Serialize};

/// Rows of one cursor page plus the tokens needed to move on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorPage<T> {
    pub data: Vec<T>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_cursor: Option<String>,

    pub has_more: bool,
}

impl<T> CursorPage<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            data,
            next_cursor: None,
            prev_cursor: None,
            has_more: false,
        }
    }

    #[must_use]
    pub fn with_next(mut self, cursor: impl Into<String>) -> Self {
        self.next_cursor = Some(cursor.into());
        self.has_more = true;
        self
    }

    #[must_use]
    pub fn with_prev(mut self, cursor: impl Into<String>) -> Self {
        self.prev_cursor = Some(cursor.into());
        self
    }
}
