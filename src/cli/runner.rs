//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, CursorAction, MetadataArgs, OutputFormat};
use crate::config::{load_config, MetakitConfig};
use crate::cursor::{self, CursorValues};
use crate::database::{open_connection, DuckDbExecutor, DuckDbQuery};
use crate::error::{Error, Result, ResultExt};
use crate::pagination::Paginator;
use crate::sql::query_paginate_with_count;
use crate::types::{Dialect, JsonValue};
use serde_json::json;
use tracing::debug;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub fn run(&self) -> Result<()> {
        let config = self.load_config()?;

        match &self.cli.command {
            Commands::Validate {
                metadata,
                total_rows,
            } => self.validate(&config, metadata, *total_rows),
            Commands::Optimize { query, dialect } => {
                self.optimize(&config, query, dialect.unwrap_or(config.dialect()))
            }
            Commands::Cursor { action } => self.cursor(action),
            Commands::Paginate {
                database,
                table,
                query,
                dialect,
                setup,
                metadata,
            } => {
                let conn = open_connection(database.as_deref())?;
                if let Some(setup) = setup {
                    conn.execute_batch(setup)
                        .context("Setup SQL failed")?;
                }
                let args = metadata;
                match (table, query) {
                    (Some(table), _) => self.paginate_table(&config, &conn, table, args),
                    (None, Some(query)) => self.paginate_query(
                        &config,
                        &conn,
                        query,
                        dialect.unwrap_or(config.dialect()),
                        args,
                    ),
                    (None, None) => Err(Error::config("Either --table or --query is required")),
                }
            }
        }
    }

    /// Load the config file, or defaults when none was given
    fn load_config(&self) -> Result<MetakitConfig> {
        match &self.cli.config {
            Some(path) => {
                debug!(path = %path.display(), "loading config");
                load_config(path)
            }
            None => Ok(MetakitConfig::default()),
        }
    }

    fn validate(
        &self,
        config: &MetakitConfig,
        args: &MetadataArgs,
        total_rows: Option<i64>,
    ) -> Result<()> {
        let mut metadata = args.apply(config.metadata());
        if let Some(total) = total_rows {
            metadata.total_rows = total;
        }

        let result = metadata.validate();
        if result.is_valid {
            metadata.normalize();
        }

        self.emit(&json!({
            "is_valid": result.is_valid,
            "errors": result.errors,
            "metadata": metadata,
        }))
    }

    fn optimize(&self, config: &MetakitConfig, query: &str, dialect: Dialect) -> Result<()> {
        let optimized = config.optimizer().optimize(query, dialect);
        self.emit(&json!({
            "dialect": dialect,
            "query": optimized,
        }))
    }

    fn cursor(&self, action: &CursorAction) -> Result<()> {
        match action {
            CursorAction::Encode { pairs } => {
                let values = parse_pairs(pairs)?;
                self.emit(&json!({
                    "cursor": cursor::encode(&values),
                    "payload": values.payload(),
                }))
            }
            CursorAction::Decode { token, field } => {
                let payload = cursor::decode(token)?;
                let value = field
                    .as_deref()
                    .map(|f| cursor::comparison_value(&payload, f))
                    .transpose()?;
                self.emit(&json!({
                    "payload": payload,
                    "value": value,
                }))
            }
        }
    }

    fn paginate_table(
        &self,
        config: &MetakitConfig,
        conn: &duckdb::Connection,
        table: &str,
        args: &MetadataArgs,
    ) -> Result<()> {
        let mut metadata = args.apply(config.metadata());
        let mut source = DuckDbQuery::new(conn, table)?;
        config.optimizer().apply_to(&mut source);

        let page = Paginator::new(&mut source, &mut metadata)
            .on_invalid_cursor(config.on_invalid_cursor)
            .run()?;

        self.emit(&json!({
            "data": page.rows,
            "next_cursor": page.next_cursor,
            "has_more": page.has_more,
            "trace": page.trace,
            "metadata": metadata,
        }))
    }

    fn paginate_query(
        &self,
        config: &MetakitConfig,
        conn: &duckdb::Connection,
        query: &str,
        dialect: Dialect,
        args: &MetadataArgs,
    ) -> Result<()> {
        let mut metadata = args.apply(config.metadata());
        let executor = DuckDbExecutor::new(conn);
        let rows = query_paginate_with_count(&executor, dialect, query, &mut metadata, vec![])?;

        self.emit(&json!({
            "data": rows,
            "metadata": metadata,
        }))
    }

    /// Print a JSON document in the selected format
    fn emit(&self, value: &JsonValue) -> Result<()> {
        let text = match self.cli.format {
            OutputFormat::Json => serde_json::to_string(value)?,
            OutputFormat::Pretty => serde_json::to_string_pretty(value)?,
        };
        println!("{text}");
        Ok(())
    }
}

/// Parse `key=value` pairs into cursor values, keeping their order
fn parse_pairs(pairs: &[String]) -> Result<CursorValues> {
    let mut values = CursorValues::new();
    for pair in pairs {
        let (key, raw) = pair
            .split_once('=')
            .ok_or_else(|| Error::config(format!("Expected key=value, got '{pair}'")))?;
        let value = serde_json::from_str::<JsonValue>(raw)
            .unwrap_or_else(|_| JsonValue::String(raw.to_string()));
        values.insert(key.trim(), value);
    }
    Ok(values)
}
