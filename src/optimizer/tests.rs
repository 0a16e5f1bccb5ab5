//! Tests for optimizer module

use super::*;
use crate::types::Dialect;
use pretty_assertions::assert_eq;
use std::time::Duration;
use test_case::test_case;

fn hints_only() -> QueryOptimizer {
    QueryOptimizer::builder().index_hint(true).max_rows(0).build()
}

#[test]
fn test_defaults() {
    let optimizer = QueryOptimizer::default();
    assert!(optimizer.use_index_hint());
    assert!(optimizer.use_query_cache());
    assert_eq!(optimizer.batch_size(), 1000);
    assert_eq!(optimizer.timeout(), Duration::from_secs(30));
    assert_eq!(optimizer.max_rows(), 10_000);
    assert!(!optimizer.use_materialized());
    assert_eq!(QueryOptimizer::builder().build(), optimizer);
}

// ============================================================================
// Index Hints
// ============================================================================

#[test]
fn test_mysql_index_hint() {
    assert_eq!(
        hints_only().optimize("SELECT * FROM users WHERE age > 18", Dialect::MySql),
        "SELECT * FROM users FORCE INDEX (idx_created_at) WHERE age > 18"
    );
}

#[test]
fn test_postgres_index_hint() {
    assert_eq!(
        hints_only().optimize("SELECT * FROM users WHERE age > 18", Dialect::PostgreSql),
        "SELECT * FROM users WHERE /*+ IndexScan(table_name idx_created_at) */ age > 18"
    );
}

#[test_case(Dialect::MySql ; "mysql")]
#[test_case(Dialect::PostgreSql ; "postgres")]
#[test_case(Dialect::Sqlite ; "sqlite")]
fn test_no_where_no_hint(dialect: Dialect) {
    assert_eq!(
        hints_only().optimize("SELECT * FROM users", dialect),
        "SELECT * FROM users"
    );
}

#[test]
fn test_sqlite_gets_no_hint() {
    assert_eq!(
        hints_only().optimize("SELECT * FROM users WHERE age > 18", Dialect::Sqlite),
        "SELECT * FROM users WHERE age > 18"
    );
}

#[test]
fn test_hint_skips_where_in_literals_and_subqueries() {
    let query = "SELECT * FROM (SELECT * FROM t WHERE x = 1) s WHERE note = 'WHERE'";
    assert_eq!(
        hints_only().optimize(query, Dialect::MySql),
        "SELECT * FROM (SELECT * FROM t WHERE x = 1) s FORCE INDEX (idx_created_at) WHERE note = 'WHERE'"
    );
}

#[test]
fn test_lowercase_where_is_hinted() {
    assert_eq!(
        hints_only().optimize("select * from users where age > 18", Dialect::MySql),
        "select * from users FORCE INDEX (idx_created_at) where age > 18"
    );
}

#[test]
fn test_hints_disabled() {
    let optimizer = QueryOptimizer::builder().index_hint(false).max_rows(0).build();
    assert_eq!(
        optimizer.optimize("SELECT * FROM users WHERE age > 18", Dialect::MySql),
        "SELECT * FROM users WHERE age > 18"
    );
}

// ============================================================================
// Materialized Prefix and Row Cap
// ============================================================================

#[test_case(Dialect::PostgreSql, "WITH MATERIALIZED SELECT * FROM users" ; "postgres")]
#[test_case(Dialect::MySql, "WITH RECURSIVE SELECT * FROM users" ; "mysql")]
#[test_case(Dialect::Sqlite, "SELECT * FROM users" ; "sqlite")]
fn test_materialized(dialect: Dialect, expected: &str) {
    let optimizer = QueryOptimizer::builder().materialized(true).max_rows(0).build();
    assert_eq!(optimizer.optimize("SELECT * FROM users", dialect), expected);
}

#[test]
fn test_row_limit() {
    let optimizer = QueryOptimizer::builder().max_rows(100).build();
    assert_eq!(
        optimizer.optimize("SELECT * FROM users", Dialect::PostgreSql),
        "SELECT * FROM users LIMIT 100"
    );
}

#[test]
fn test_all_rewrites_in_order() {
    let optimizer = QueryOptimizer::builder().materialized(true).max_rows(50).build();
    assert_eq!(
        optimizer.optimize("SELECT * FROM events WHERE kind = $1", Dialect::PostgreSql),
        "WITH MATERIALIZED SELECT * FROM events WHERE /*+ IndexScan(table_name idx_created_at) */ kind = $1 LIMIT 50"
    );
}
