//! Pagination metadata module
//!
//! Holds the per-request pagination state and the rules that validate it.
//!
//! # Overview
//!
//! A [`Metadata`] starts with the caller's raw parameters (page, page size,
//! sort, cursor, selected fields). [`Metadata::validate`] reports every rule it
//! breaks without touching it, and [`Metadata::normalize`] clamps it into range
//! and derives total pages, row range and neighbour flags once the total row
//! count is known.

mod types;
mod validation;

pub use types::{total_pages, Metadata, ALL_FIELDS, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use validation::{ErrorCode, Rule, ValidationError, ValidationResult};
