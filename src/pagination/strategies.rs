//! Pagination strategy implementations
//!
//! Each strategy shapes a query source for one pagination mode.

use super::types::{CursorRow, InvalidCursorPolicy, QuerySource};
use crate::cursor::{self, CursorValues};
use crate::error::Result;
use crate::metadata::Metadata;
use crate::sql::check_identifier;
use crate::types::PaginationMode;
use tracing::{debug, warn};

/// Shapes a query source for the page described by a metadata record
pub trait Strategy {
    fn mode(&self) -> PaginationMode;

    /// Add ordering, filters and limits for the current page
    fn apply<Q: QuerySource + ?Sized>(&self, source: &mut Q, metadata: &Metadata) -> Result<()>;
}

// ============================================================================
// Offset Pagination
// ============================================================================

/// Skip `(page - 1) * page_size` rows and take `page_size`
#[derive(Debug, Clone, Copy, Default)]
pub struct OffsetStrategy;

impl Strategy for OffsetStrategy {
    fn mode(&self) -> PaginationMode {
        PaginationMode::Offset
    }

    fn apply<Q: QuerySource + ?Sized>(&self, source: &mut Q, metadata: &Metadata) -> Result<()> {
        if !metadata.sort.is_empty() {
            check_identifier(&metadata.sort)?;
            source.order_by(&metadata.sort, metadata.direction());
        }
        source.offset(metadata.offset());
        source.limit(metadata.limit());
        Ok(())
    }
}

// ============================================================================
// Cursor Pagination
// ============================================================================

/// Keyset traversal on `cursor_field`
///
/// The next page continues strictly after the value carried by the cursor,
/// in the direction of `cursor_order`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CursorStrategy {
    pub on_invalid: InvalidCursorPolicy,
}

impl CursorStrategy {
    pub fn new(on_invalid: InvalidCursorPolicy) -> Self {
        Self { on_invalid }
    }

    /// Cursor for the page after `last`: the cursor field value, the row `id`
    /// when present, and the current page number.
    ///
    /// A qualified field such as `users.created_at` is also looked up by its
    /// column name, since rows are keyed by bare column names. Returns `None`
    /// when the row carries neither.
    pub fn next_cursor<R: CursorRow + ?Sized>(&self, last: &R, metadata: &Metadata) -> Option<String> {
        let field = metadata.cursor_field.as_str();
        let column = field.rsplit('.').next().unwrap_or(field);
        let Some(value) = last.value(field).or_else(|| last.value(column)) else {
            warn!(
                field = %metadata.cursor_field,
                "last row has no cursor field value; no next cursor"
            );
            return None;
        };

        let mut values = CursorValues::new().with(metadata.cursor_field.clone(), value);
        if let Some(id) = last.value("id") {
            values.insert("id", id);
        }
        values.insert("page", metadata.page);

        Some(cursor::encode(&values))
    }
}

impl Strategy for CursorStrategy {
    fn mode(&self) -> PaginationMode {
        PaginationMode::Cursor
    }

    fn apply<Q: QuerySource + ?Sized>(&self, source: &mut Q, metadata: &Metadata) -> Result<()> {
        let field = check_identifier(&metadata.cursor_field)?;
        let direction = metadata.cursor_direction();
        source.order_by(field, direction);

        if !metadata.cursor.is_empty() {
            let decoded = cursor::decode(&metadata.cursor)
                .and_then(|payload| cursor::comparison_value(&payload, field));
            match decoded {
                Ok(value) => {
                    debug!(field, ?value, "resuming after cursor");
                    source.filter(field, direction.cursor_comparison(), &value);
                }
                Err(e) => match self.on_invalid {
                    InvalidCursorPolicy::Ignore => {
                        warn!(error = %e, "ignoring undecodable cursor");
                    }
                    InvalidCursorPolicy::Reject => return Err(e),
                },
            }
        }

        source.limit(metadata.limit());
        Ok(())
    }
}
