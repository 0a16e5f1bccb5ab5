//! Pagination module
//!
//! Supports: Offset, Cursor (keyset)
//!
//! # Overview
//!
//! The driver takes a [`Metadata`](crate::metadata::Metadata) record and a
//! [`QuerySource`], and moves through validate → count → fetch → finalize.
//! Offset mode skips `(page - 1) * page_size` rows; cursor mode resumes
//! strictly after the value carried in an opaque cursor and hands back the
//! cursor for the following page.

mod driver;
mod strategies;
mod types;

pub use driver::{optimized_paginate, paginate, paginate_with_count, Paginator};
pub use strategies::{CursorStrategy, OffsetStrategy, Strategy};
pub use types::{
    CountSource, CursorRow, InvalidCursorPolicy, Page, QuerySource, QueryTrace, Stage,
};

#[cfg(test)]
mod tests;
