//! CLI commands and argument parsing

use crate::metadata::Metadata;
use crate::types::Dialect;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Pagination metadata toolkit
#[derive(Parser, Debug)]
#[command(name = "metakit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate pagination parameters and show the normalized metadata
    Validate {
        #[command(flatten)]
        metadata: MetadataArgs,

        /// Total row count used to derive pages
        #[arg(long)]
        total_rows: Option<i64>,
    },

    /// Rewrite a query with optimizer hints
    Optimize {
        /// SQL query to rewrite
        query: String,

        /// Target dialect (defaults to the configured one)
        #[arg(short, long, value_parser = parse_dialect)]
        dialect: Option<Dialect>,
    },

    /// Encode or decode cursor tokens
    Cursor {
        #[command(subcommand)]
        action: CursorAction,
    },

    /// Paginate a table or query in a DuckDB database
    Paginate {
        /// DuckDB database file (in-memory when omitted)
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Table to paginate
        #[arg(short, long, conflicts_with = "query", required_unless_present = "query")]
        table: Option<String>,

        /// Raw SQL query to paginate instead of a table
        #[arg(short, long)]
        query: Option<String>,

        /// Dialect the raw query is written in
        #[arg(long, value_parser = parse_dialect)]
        dialect: Option<Dialect>,

        /// SQL run before paginating (e.g. to create and fill a table)
        #[arg(long)]
        setup: Option<String>,

        #[command(flatten)]
        metadata: MetadataArgs,
    },
}

/// Cursor subcommands
#[derive(Subcommand, Debug)]
pub enum CursorAction {
    /// Encode `key=value` pairs, in order, into a token
    ///
    /// Values are parsed as JSON when possible, otherwise taken as strings.
    Encode {
        #[arg(required = true)]
        pairs: Vec<String>,
    },

    /// Decode a token into its payload
    Decode {
        token: String,

        /// Also extract the comparison value for this field
        #[arg(long)]
        field: Option<String>,
    },
}

/// Pagination parameters shared by several commands
#[derive(Args, Debug, Clone, Default)]
pub struct MetadataArgs {
    #[arg(long)]
    pub page: Option<i64>,

    #[arg(long)]
    pub page_size: Option<i64>,

    #[arg(long)]
    pub sort: Option<String>,

    #[arg(long)]
    pub sort_direction: Option<String>,

    #[arg(long)]
    pub cursor: Option<String>,

    #[arg(long)]
    pub cursor_field: Option<String>,

    #[arg(long)]
    pub cursor_order: Option<String>,

    /// Comma-separated fields to select
    #[arg(long, value_delimiter = ',')]
    pub fields: Vec<String>,

    /// Validation rule as `target=rule`, e.g. `page_size=max:50`
    #[arg(long = "rule")]
    pub rules: Vec<String>,

    /// Record issued SQL and timings
    #[arg(long)]
    pub debug: bool,
}

impl MetadataArgs {
    /// Overlay the given arguments on `base`
    pub fn apply(&self, base: Metadata) -> Metadata {
        let mut m = base;
        if let Some(page) = self.page {
            m = m.with_page(page);
        }
        if let Some(size) = self.page_size {
            m = m.with_page_size(size);
        }
        if let Some(sort) = &self.sort {
            m = m.with_sort(sort.clone());
        }
        if let Some(direction) = &self.sort_direction {
            m = m.with_sort_direction(direction.clone());
        }
        if let Some(cursor) = &self.cursor {
            m = m.with_cursor(cursor.clone());
        }
        if let Some(field) = &self.cursor_field {
            m = m.with_cursor_field(field.clone());
        }
        if let Some(order) = &self.cursor_order {
            m = m.with_cursor_order(order.clone());
        }
        if !self.fields.is_empty() {
            m = m.with_fields(self.fields.iter().map(|f| f.trim().to_string()));
        }
        for rule in &self.rules {
            if let Some((target, rule)) = rule.split_once('=') {
                m = m.with_validation_rule(target.trim(), rule.trim());
            }
        }
        if self.debug {
            m = m.with_debug(true);
        }
        m
    }
}

fn parse_dialect(value: &str) -> Result<Dialect, String> {
    value.parse().map_err(|e: crate::Error| e.to_string())
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Compact JSON on one line
    Json,
    /// Indented JSON
    Pretty,
}
