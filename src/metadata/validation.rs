//! Metadata validation
//!
//! Built-in range checks plus a small rule language attached per field:
//! `max:<int>`, `min:<int>` and `in:<comma separated values>`.

use super::types::{Metadata, ALL_FIELDS, MAX_PAGE_SIZE};
use crate::types::SortDirection;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Machine-readable violation code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidPage,
    InvalidPageSize,
    PageSizeTooLarge,
    InvalidSortDirection,
    MissingCursorField,
    InvalidCursorOrder,
    PageSizeExceedsMax,
    PageSizeBelowMin,
    InvalidSortField,
    InvalidSelectedField,
    InvalidValidationRule,
    PageOutOfRange,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidPage => "INVALID_PAGE",
            Self::InvalidPageSize => "INVALID_PAGE_SIZE",
            Self::PageSizeTooLarge => "PAGE_SIZE_TOO_LARGE",
            Self::InvalidSortDirection => "INVALID_SORT_DIRECTION",
            Self::MissingCursorField => "MISSING_CURSOR_FIELD",
            Self::InvalidCursorOrder => "INVALID_CURSOR_ORDER",
            Self::PageSizeExceedsMax => "PAGE_SIZE_EXCEEDS_MAX",
            Self::PageSizeBelowMin => "PAGE_SIZE_BELOW_MIN",
            Self::InvalidSortField => "INVALID_SORT_FIELD",
            Self::InvalidSelectedField => "INVALID_SELECTED_FIELD",
            Self::InvalidValidationRule => "INVALID_VALIDATION_RULE",
            Self::PageOutOfRange => "PAGE_OUT_OF_RANGE",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field-level violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub code: ErrorCode,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>, code: ErrorCode) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            code,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.field, self.code, self.message)
    }
}

/// Outcome of validating a [`Metadata`]
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    fn from_errors(errors: Vec<ValidationError>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    /// Codes of every violation, in report order
    pub fn codes(&self) -> Vec<ErrorCode> {
        self.errors.iter().map(|e| e.code).collect()
    }
}

/// Parsed form of a rule string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    Max(i64),
    Min(i64),
    In(Vec<String>),
}

impl Rule {
    /// Parse `max:N`, `min:N` or `in:a,b,c`
    pub fn parse(rule: &str) -> Option<Self> {
        let (kind, arg) = rule.split_once(':')?;
        match kind.trim() {
            "max" => arg.trim().parse().ok().map(Rule::Max),
            "min" => arg.trim().parse().ok().map(Rule::Min),
            "in" => {
                let allowed: Vec<String> = arg
                    .split(',')
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(String::from)
                    .collect();
                if allowed.is_empty() {
                    None
                } else {
                    Some(Rule::In(allowed))
                }
            }
            _ => None,
        }
    }
}

impl Metadata {
    /// Check the metadata without modifying it.
    ///
    /// Every check runs, so a request breaking several rules reports all of them.
    pub fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();

        if self.page < 1 {
            errors.push(ValidationError::new(
                "page",
                "page must be greater than or equal to 1",
                ErrorCode::InvalidPage,
            ));
        }

        if self.page_size < 1 {
            errors.push(ValidationError::new(
                "page_size",
                "page size must be greater than or equal to 1",
                ErrorCode::InvalidPageSize,
            ));
        }

        if self.page_size > MAX_PAGE_SIZE {
            errors.push(ValidationError::new(
                "page_size",
                format!("page size must not exceed {MAX_PAGE_SIZE}"),
                ErrorCode::PageSizeTooLarge,
            ));
        }

        if self.page >= 1
            && (1..=MAX_PAGE_SIZE).contains(&self.page_size)
            && self.page.checked_mul(self.page_size).is_none()
        {
            errors.push(ValidationError::new(
                "page",
                "page is too large for the page size",
                ErrorCode::PageOutOfRange,
            ));
        }

        if !self.sort_direction.is_empty() && SortDirection::parse(&self.sort_direction).is_none()
        {
            errors.push(ValidationError::new(
                "sort_direction",
                "sort direction must be either 'asc' or 'desc'",
                ErrorCode::InvalidSortDirection,
            ));
        }

        if !self.cursor.is_empty() && self.cursor_field.is_empty() {
            errors.push(ValidationError::new(
                "cursor_field",
                "cursor field is required when a cursor is provided",
                ErrorCode::MissingCursorField,
            ));
        }

        if !self.cursor_field.is_empty()
            && !self.cursor_order.is_empty()
            && SortDirection::parse(&self.cursor_order).is_none()
        {
            errors.push(ValidationError::new(
                "cursor_order",
                "cursor order must be either 'asc' or 'desc'",
                ErrorCode::InvalidCursorOrder,
            ));
        }

        for (field, rule) in &self.validation_rules {
            if let Some(error) = self.check_rule(field, rule) {
                errors.push(error);
            }
        }

        ValidationResult::from_errors(errors)
    }

    fn check_rule(&self, field: &str, raw: &str) -> Option<ValidationError> {
        if !matches!(field, "page_size" | "sort" | "fields") {
            return None;
        }

        let Some(rule) = Rule::parse(raw) else {
            return Some(invalid_rule(field, raw));
        };

        match (field, rule) {
            ("page_size", Rule::Max(max)) if self.page_size > max => Some(ValidationError::new(
                field,
                format!("page size must not exceed {max}"),
                ErrorCode::PageSizeExceedsMax,
            )),
            ("page_size", Rule::Min(min)) if self.page_size < min => Some(ValidationError::new(
                field,
                format!("page size must be at least {min}"),
                ErrorCode::PageSizeBelowMin,
            )),
            ("page_size", Rule::Max(_) | Rule::Min(_)) => None,
            ("sort", Rule::In(allowed)) => {
                if self.sort.is_empty() || allowed.contains(&self.sort) {
                    None
                } else {
                    Some(ValidationError::new(
                        field,
                        format!(
                            "sort field '{}' must be one of: {}",
                            self.sort,
                            allowed.join(", ")
                        ),
                        ErrorCode::InvalidSortField,
                    ))
                }
            }
            ("fields", Rule::In(allowed)) => self
                .selected_fields
                .iter()
                .find(|f| f.as_str() != ALL_FIELDS && !allowed.contains(f))
                .map(|bad| {
                    ValidationError::new(
                        field,
                        format!(
                            "field '{bad}' is not selectable, allowed: {}",
                            allowed.join(", ")
                        ),
                        ErrorCode::InvalidSelectedField,
                    )
                }),
            _ => Some(invalid_rule(field, raw)),
        }
    }
}

fn invalid_rule(field: &str, raw: &str) -> ValidationError {
    ValidationError::new(
        field,
        format!("rule '{raw}' cannot be applied to '{field}'"),
        ErrorCode::InvalidValidationRule,
    )
}
