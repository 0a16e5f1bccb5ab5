//! Configuration loaded from YAML
//!
//! A config file seeds request metadata (default page size, validation
//! rules, debug) and the query optimizer.
//!
//! ```yaml
//! dialect: postgresql
//! debug: false
//! on_invalid_cursor: ignore
//! pagination:
//!   page_size: 20
//!   validation_rules:
//!     page_size: "max:50"
//!     sort: "in:id,name,created_at"
//! optimizer:
//!   use_index_hint: true
//!   batch_size: 500
//!   timeout_secs: 10
//!   max_rows: 5000
//! ```

use crate::error::{Error, Result, ResultExt};
use crate::metadata::{Metadata, Rule, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::optimizer::QueryOptimizer;
use crate::pagination::InvalidCursorPolicy;
use crate::types::Dialect;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Rule targets understood by the validator
const RULE_TARGETS: [&str; 3] = ["page_size", "sort", "fields"];

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete metakit configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetakitConfig {
    /// Dialect for raw SQL pagination and query rewriting
    pub dialect: Option<Dialect>,

    /// Record issued SQL and timings
    pub debug: bool,

    /// Driver behaviour for undecodable cursors
    pub on_invalid_cursor: InvalidCursorPolicy,

    pub pagination: PaginationDefaults,

    pub optimizer: OptimizerConfig,
}

// ============================================================================
// Pagination Defaults
// ============================================================================

/// Defaults applied to every request's metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaginationDefaults {
    pub page_size: i64,

    /// Rule strings keyed by target (`page_size`, `sort`, `fields`)
    pub validation_rules: BTreeMap<String, String>,
}

impl Default for PaginationDefaults {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            validation_rules: BTreeMap::new(),
        }
    }
}

// ============================================================================
// Optimizer Config
// ============================================================================

/// Optimizer settings as written in YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizerConfig {
    pub use_index_hint: bool,
    pub use_query_cache: bool,
    pub batch_size: usize,
    /// Statement timeout in seconds
    pub timeout_secs: u64,
    /// Row cap for rewritten queries (0 disables)
    pub max_rows: i64,
    pub use_materialized: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        let defaults = QueryOptimizer::default();
        Self {
            use_index_hint: defaults.use_index_hint(),
            use_query_cache: defaults.use_query_cache(),
            batch_size: defaults.batch_size(),
            timeout_secs: defaults.timeout().as_secs(),
            max_rows: defaults.max_rows(),
            use_materialized: defaults.use_materialized(),
        }
    }
}

impl MetakitConfig {
    /// Build the optimizer described by this config
    pub fn optimizer(&self) -> QueryOptimizer {
        let o = &self.optimizer;
        QueryOptimizer::builder()
            .index_hint(o.use_index_hint)
            .query_cache(o.use_query_cache)
            .batch_size(o.batch_size)
            .timeout(Duration::from_secs(o.timeout_secs))
            .max_rows(o.max_rows)
            .materialized(o.use_materialized)
            .build()
    }

    /// Fresh request metadata seeded with the configured defaults
    pub fn metadata(&self) -> Metadata {
        let mut metadata = Metadata::new()
            .with_page_size(self.pagination.page_size)
            .with_debug(self.debug);
        for (target, rule) in &self.pagination.validation_rules {
            metadata = metadata.with_validation_rule(target.clone(), rule.clone());
        }
        metadata
    }

    /// Configured dialect, PostgreSQL when unset
    pub fn dialect(&self) -> Dialect {
        self.dialect.unwrap_or(Dialect::PostgreSql)
    }
}

/// Load a config from a YAML file
pub fn load_config(path: impl AsRef<Path>) -> Result<MetakitConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    load_config_from_str(&content)
}

/// Load a config from a YAML string
pub fn load_config_from_str(yaml: &str) -> Result<MetakitConfig> {
    let config: MetakitConfig = if yaml.trim().is_empty() {
        MetakitConfig::default()
    } else {
        serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Failed to parse config YAML: {e}")))?
    };

    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &MetakitConfig) -> Result<()> {
    let page_size = config.pagination.page_size;
    if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
        return Err(Error::invalid_config(
            "pagination.page_size",
            format!("must be between 1 and {MAX_PAGE_SIZE}, got {page_size}"),
        ));
    }

    for (target, rule) in &config.pagination.validation_rules {
        if !RULE_TARGETS.contains(&target.as_str()) {
            return Err(Error::invalid_config(
                format!("pagination.validation_rules.{target}"),
                format!("unknown rule target, expected one of {}", RULE_TARGETS.join(", ")),
            ));
        }
        if Rule::parse(rule).is_none() {
            return Err(Error::invalid_config(
                format!("pagination.validation_rules.{target}"),
                format!("cannot parse rule '{rule}'"),
            ));
        }
    }

    if config.optimizer.batch_size == 0 {
        return Err(Error::invalid_config(
            "optimizer.batch_size",
            "must be positive",
        ));
    }

    if config.optimizer.max_rows < 0 {
        return Err(Error::invalid_config(
            "optimizer.max_rows",
            "must not be negative",
        ));
    }

    Ok(())
}
