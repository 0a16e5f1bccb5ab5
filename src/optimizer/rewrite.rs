//! Optimizer settings and query rewriting

use crate::pagination::QuerySource;
use crate::sql::scan::split_at_keyword;
use crate::types::Dialect;
use std::time::Duration;
use tracing::debug;

/// Index named by every hint
pub const INDEX_NAME: &str = "idx_created_at";

/// Immutable optimizer settings
///
/// Built through [`QueryOptimizer::builder`]. `use_query_cache` is carried as
/// a flag only; nothing caches results.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptimizer {
    use_index_hint: bool,
    use_query_cache: bool,
    batch_size: usize,
    timeout: Duration,
    max_rows: i64,
    use_materialized: bool,
}

impl Default for QueryOptimizer {
    fn default() -> Self {
        Self {
            use_index_hint: true,
            use_query_cache: true,
            batch_size: 1000,
            timeout: Duration::from_secs(30),
            max_rows: 10_000,
            use_materialized: false,
        }
    }
}

impl QueryOptimizer {
    /// Create a new optimizer builder seeded with the defaults
    pub fn builder() -> QueryOptimizerBuilder {
        QueryOptimizerBuilder::default()
    }

    pub fn use_index_hint(&self) -> bool {
        self.use_index_hint
    }

    pub fn use_query_cache(&self) -> bool {
        self.use_query_cache
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_rows(&self) -> i64 {
        self.max_rows
    }

    pub fn use_materialized(&self) -> bool {
        self.use_materialized
    }

    /// Rewrite `query` for `dialect`.
    ///
    /// Applied in order: index hint, materialized prefix, row cap.
    pub fn optimize(&self, query: &str, dialect: Dialect) -> String {
        let mut optimized = query.to_string();

        if self.use_index_hint {
            optimized = index_hint(&optimized, dialect);
        }

        if self.use_materialized {
            optimized = materialized(&optimized, dialect);
        }

        if self.max_rows > 0 {
            optimized = format!("{optimized} LIMIT {}", self.max_rows);
        }

        debug!(%dialect, query = %optimized, "optimized query");
        optimized
    }

    /// Hand the advisory settings to a query source
    pub fn apply_to<Q: QuerySource + ?Sized>(&self, source: &mut Q) {
        if self.use_index_hint {
            source.index_hint(INDEX_NAME);
        }
        if self.batch_size > 0 {
            source.batch_size(self.batch_size);
        }
        if !self.timeout.is_zero() {
            source.timeout(self.timeout);
        }
        if self.max_rows > 0 {
            source.limit(self.max_rows);
        }
    }
}

/// Hint placed around the first top-level `WHERE`; no-op without one
fn index_hint(query: &str, dialect: Dialect) -> String {
    let Some(split) = split_at_keyword(query, "WHERE") else {
        return query.to_string();
    };

    match dialect {
        Dialect::MySql => format!(
            "{}FORCE INDEX ({INDEX_NAME}) {}{}",
            split.head, split.keyword, split.rest
        ),
        Dialect::PostgreSql => format!(
            "{}{} /*+ IndexScan(table_name {INDEX_NAME}) */{}",
            split.head, split.keyword, split.rest
        ),
        Dialect::Sqlite => query.to_string(),
    }
}

fn materialized(query: &str, dialect: Dialect) -> String {
    match dialect {
        Dialect::PostgreSql => format!("WITH MATERIALIZED {query}"),
        // FIXME: not a materialization hint in MySQL; kept for compatibility
        Dialect::MySql => format!("WITH RECURSIVE {query}"),
        Dialect::Sqlite => query.to_string(),
    }
}

/// Builder for [`QueryOptimizer`]
#[derive(Debug, Default)]
pub struct QueryOptimizerBuilder {
    optimizer: QueryOptimizer,
}

impl QueryOptimizerBuilder {
    /// Enable or disable index hints
    pub fn index_hint(mut self, enabled: bool) -> Self {
        self.optimizer.use_index_hint = enabled;
        self
    }

    pub fn query_cache(mut self, enabled: bool) -> Self {
        self.optimizer.use_query_cache = enabled;
        self
    }

    /// Set the advisory batch size
    pub fn batch_size(mut self, size: usize) -> Self {
        self.optimizer.batch_size = size;
        self
    }

    /// Set the advisory statement timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.optimizer.timeout = timeout;
        self
    }

    /// Cap the rows of rewritten queries; 0 disables the cap
    pub fn max_rows(mut self, max: i64) -> Self {
        self.optimizer.max_rows = max;
        self
    }

    pub fn materialized(mut self, enabled: bool) -> Self {
        self.optimizer.use_materialized = enabled;
        self
    }

    /// Build the optimizer
    pub fn build(self) -> QueryOptimizer {
        self.optimizer
    }
}
