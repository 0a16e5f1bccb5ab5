//! Query optimizer
//!
//! Dialect-aware rewriting of a raw query string (index hint, materialized
//! prefix, row cap) and advisory settings handed to query sources.
//!
//! The rewrites are textual hints, not planning: the optimizer never inspects
//! the schema and always names the `idx_created_at` index.

mod rewrite;

pub use rewrite::{QueryOptimizer, QueryOptimizerBuilder, INDEX_NAME};

#[cfg(test)]
mod tests;
