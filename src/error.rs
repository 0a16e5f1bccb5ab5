//! Error types for metakit
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use crate::metadata::ValidationError;
use thiserror::Error;

/// The main error type for metakit
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Metadata Errors
    // ============================================================================
    #[error("invalid metadata: {}", format_violations(.errors))]
    InvalidMetadata { errors: Vec<ValidationError> },

    #[error("invalid cursor: {message}")]
    InvalidCursor { message: String },

    #[error("unsafe SQL identifier '{identifier}'")]
    UnsafeIdentifier { identifier: String },

    #[error("unsupported base query: {message}")]
    UnsupportedQuery { message: String },

    #[error("pagination step '{step}' not allowed in stage {stage}")]
    Stage { step: &'static str, stage: String },

    // ============================================================================
    // Data Source Errors
    // ============================================================================
    #[error("Data source error: {message}")]
    DataSource { message: String },

    #[error("Database error: {0}")]
    Database(#[from] duckdb::Error),

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an invalid metadata error from a validation report
    pub fn invalid_metadata(errors: Vec<ValidationError>) -> Self {
        Self::InvalidMetadata { errors }
    }

    /// Create an invalid cursor error
    pub fn invalid_cursor(message: impl Into<String>) -> Self {
        Self::InvalidCursor {
            message: message.into(),
        }
    }

    /// Create an unsafe identifier error
    pub fn unsafe_identifier(identifier: impl Into<String>) -> Self {
        Self::UnsafeIdentifier {
            identifier: identifier.into(),
        }
    }

    /// Create an unsupported base query error
    pub fn unsupported_query(message: impl Into<String>) -> Self {
        Self::UnsupportedQuery {
            message: message.into(),
        }
    }

    /// Create a data source error
    pub fn data_source(message: impl Into<String>) -> Self {
        Self::DataSource {
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Validation violations carried by this error, if any
    pub fn violations(&self) -> &[ValidationError] {
        match self {
            Error::InvalidMetadata { errors } => errors,
            _ => &[],
        }
    }

    /// Check if this error came from the query execution layer
    pub fn is_data_source(&self) -> bool {
        matches!(self, Error::DataSource { .. } | Error::Database(_))
    }
}

fn format_violations(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for metakit
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
