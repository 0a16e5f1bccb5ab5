//! Query fragments for paginated SQL
//!
//! A paginated statement is kept as structured parts (base query, keyset
//! condition, ordering, limit, offset) and only rendered to text for a
//! specific dialect at the end, with every value bound as a parameter.

use super::scan::{count_positional, find_any_keyword, split_at_keyword};
use crate::error::{Error, Result};
use crate::types::{Comparison, Dialect, JsonValue, SortDirection};
use regex::Regex;
use std::sync::LazyLock;

/// Plain identifier, optionally qualified: `created_at`, `users.created_at`
static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*$").unwrap()
});

/// Reject anything but plain, optionally dotted, identifiers
pub fn check_identifier(name: &str) -> Result<&str> {
    if IDENTIFIER.is_match(name) {
        Ok(name)
    } else {
        Err(Error::unsafe_identifier(name))
    }
}

/// Clauses that end a `WHERE` filter
const TRAILING_CLAUSES: &[&str] = &[
    "GROUP", "HAVING", "WINDOW", "ORDER", "LIMIT", "UNION", "INTERSECT", "EXCEPT",
];

/// Keyset condition `field <op> value`
#[derive(Debug, Clone, PartialEq)]
pub struct KeysetCondition {
    pub field: String,
    pub comparison: Comparison,
    pub value: JsonValue,
}

/// Structured paginated statement over a caller-supplied base query
#[derive(Debug, Clone, PartialEq)]
pub struct PaginatedQuery {
    base: String,
    condition: Option<KeysetCondition>,
    order: Option<(String, SortDirection)>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl PaginatedQuery {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            condition: None,
            order: None,
            limit: None,
            offset: None,
        }
    }

    pub fn condition(mut self, condition: KeysetCondition) -> Result<Self> {
        check_identifier(&condition.field)?;
        self.condition = Some(condition);
        Ok(self)
    }

    pub fn order_by(mut self, field: &str, direction: SortDirection) -> Result<Self> {
        check_identifier(field)?;
        self.order = Some((field.to_string(), direction));
        Ok(self)
    }

    #[must_use]
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Render for `dialect`. `bound` holds the caller's parameters for the base
    /// query; the returned list extends it with the values bound here.
    ///
    /// The keyset predicate joins the base query's top-level `WHERE`, or gets
    /// one of its own, ahead of any trailing `GROUP BY`, `HAVING`, `WINDOW`,
    /// `ORDER BY`, `LIMIT` or set operation.
    pub fn render(&self, dialect: Dialect, bound: Vec<JsonValue>) -> (String, Vec<JsonValue>) {
        let mut params = bound;
        let base = self.base.trim_end();
        let mut sql = String::with_capacity(base.len() + 64);

        match &self.condition {
            Some(cond) => {
                let (body, tail) = match split_at_keyword(base, "WHERE") {
                    Some(split) => {
                        let at = find_any_keyword(split.rest, TRAILING_CLAUSES)
                            .unwrap_or(split.rest.len());
                        let (filter, tail) = split.rest.split_at(at);
                        (Some((split.head, split.keyword, filter.trim())), tail)
                    }
                    None => {
                        let at = find_any_keyword(base, TRAILING_CLAUSES).unwrap_or(base.len());
                        sql.push_str(base[..at].trim_end());
                        (None, &base[at..])
                    }
                };

                let placeholder = if dialect.is_positional() {
                    let at = params.len().saturating_sub(count_positional(tail));
                    params.insert(at, cond.value.clone());
                    dialect.placeholder(at + 1)
                } else {
                    params.push(cond.value.clone());
                    dialect.placeholder(params.len())
                };
                let predicate = format!("{} {} {placeholder}", cond.field, cond.comparison);

                match body {
                    Some((head, keyword, existing)) => {
                        sql.push_str(head);
                        sql.push_str(keyword);
                        sql.push_str(&format!(" ({existing}) AND {predicate}"));
                    }
                    None => sql.push_str(&format!(" WHERE {predicate}")),
                }
                let tail = tail.trim();
                if !tail.is_empty() {
                    sql.push(' ');
                    sql.push_str(tail);
                }
            }
            None => sql.push_str(base),
        }

        if let Some((field, direction)) = &self.order {
            sql.push_str(&format!(" ORDER BY {field} {direction}"));
        }

        if let Some(limit) = self.limit {
            params.push(JsonValue::from(limit));
            sql.push_str(&format!(" LIMIT {}", dialect.placeholder(params.len())));
        }

        if let Some(offset) = self.offset {
            params.push(JsonValue::from(offset));
            sql.push_str(&format!(" OFFSET {}", dialect.placeholder(params.len())));
        }

        (sql, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_check_identifier() {
        assert!(check_identifier("created_at").is_ok());
        assert!(check_identifier("users.created_at").is_ok());
        assert!(check_identifier("_private1").is_ok());
        assert!(check_identifier("").is_err());
        assert!(check_identifier("1abc").is_err());
        assert!(check_identifier("name; DROP TABLE users").is_err());
        assert!(check_identifier("name desc").is_err());
        assert!(check_identifier("a..b").is_err());
    }

    #[test]
    fn test_render_offset_postgres_numbers_after_caller_params() {
        let query = PaginatedQuery::new("SELECT * FROM items WHERE owner = $1")
            .order_by("id", SortDirection::Asc)
            .unwrap()
            .limit(20)
            .offset(40);

        let (sql, params) = query.render(Dialect::PostgreSql, vec![json!("alice")]);
        assert_eq!(
            sql,
            "SELECT * FROM items WHERE owner = $1 ORDER BY id asc LIMIT $2 OFFSET $3"
        );
        assert_eq!(params, vec![json!("alice"), json!(20), json!(40)]);
    }

    #[test]
    fn test_render_offset_mysql() {
        let query = PaginatedQuery::new("SELECT * FROM items")
            .order_by("name", SortDirection::Desc)
            .unwrap()
            .limit(10)
            .offset(0);

        let (sql, params) = query.render(Dialect::MySql, vec![]);
        assert_eq!(sql, "SELECT * FROM items ORDER BY name desc LIMIT ? OFFSET ?");
        assert_eq!(params, vec![json!(10), json!(0)]);
    }

    #[test]
    fn test_render_keyset_without_existing_filter() {
        let query = PaginatedQuery::new("SELECT * FROM events")
            .condition(KeysetCondition {
                field: "created_at".to_string(),
                comparison: Comparison::Lt,
                value: json!("2024-01-05"),
            })
            .unwrap()
            .order_by("created_at", SortDirection::Desc)
            .unwrap()
            .limit(10);

        let (sql, params) = query.render(Dialect::PostgreSql, vec![]);
        assert_eq!(
            sql,
            "SELECT * FROM events WHERE created_at < $1 ORDER BY created_at desc LIMIT $2"
        );
        assert_eq!(params, vec![json!("2024-01-05"), json!(10)]);
    }

    #[test]
    fn test_render_keyset_joins_existing_filter() {
        let query = PaginatedQuery::new("SELECT * FROM users WHERE age > ? OR vip = ?")
            .condition(KeysetCondition {
                field: "id".to_string(),
                comparison: Comparison::Gt,
                value: json!(3),
            })
            .unwrap()
            .order_by("id", SortDirection::Asc)
            .unwrap()
            .limit(5);

        let (sql, params) = query.render(Dialect::Sqlite, vec![json!(18), json!(true)]);
        assert_eq!(
            sql,
            "SELECT * FROM users WHERE (age > ? OR vip = ?) AND id > ? ORDER BY id asc LIMIT ?"
        );
        assert_eq!(params, vec![json!(18), json!(true), json!(3), json!(5)]);
    }

    #[test]
    fn test_render_rejects_unsafe_fields() {
        let err = PaginatedQuery::new("SELECT 1")
            .order_by("id; DROP TABLE x", SortDirection::Asc)
            .unwrap_err();
        assert!(matches!(err, Error::UnsafeIdentifier { .. }));
    }
}
