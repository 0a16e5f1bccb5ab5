//! Raw SQL module
//!
//! Pagination for callers that hold a query string and a parameterized
//! executor instead of a query builder.
//!
//! # Overview
//!
//! - [`query_paginate`] - offset or keyset pagination of a raw query
//! - [`query_paginate_with_count`] - same, after counting the query
//! - [`PaginatedQuery`] - the structured statement both render from
//!
//! Sort and cursor fields are interpolated into the statement, so they must
//! be plain identifiers; every value is bound as a parameter.

mod fragment;
mod paginate;
pub mod scan;

pub use fragment::{check_identifier, KeysetCondition, PaginatedQuery};
pub use paginate::{
    build_paginated_sql, count_sql, query_paginate, query_paginate_with_count, SqlExecutor,
};
