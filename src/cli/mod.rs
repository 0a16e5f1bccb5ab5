//! CLI module
//!
//! Command-line interface over the library.
//!
//! # Commands
//!
//! - `validate` - Check pagination parameters and show derived fields
//! - `optimize` - Rewrite a query with dialect hints
//! - `cursor encode|decode` - Work with cursor tokens
//! - `paginate` - Paginate a DuckDB table or raw query

mod commands;
mod runner;

pub use commands::{Cli, Commands, CursorAction, MetadataArgs, OutputFormat};
pub use runner::Runner;
