//! Request Validation Module
//!
//! Field-level validation for request bodies and query parameters.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email regex is valid")
});

/// Validation error types
#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValidationError {
    #[error("Required field '{field}' is missing")]
    MissingField { field: String },

    #[error("Field '{field}' is too long (max: {max}, got: {got})")]
    TooLong {
        field: String,
        max: usize,
        got: usize,
    },

    #[error("Field '{field}' contains invalid characters: {chars}")]
    InvalidCharacters { field: String, chars: String },

    #[error("Field '{field}' is not a valid email: {value}")]
    InvalidEmail { field: String, value: String },

    #[error("Field '{field}' must be between {min} and {max}, got {got}")]
    OutOfRange {
        field: String,
        min: i64,
        max: i64,
        got: i64,
    },
}

impl ValidationError {
    /// Name of the offending field
    pub fn field(&self) -> &str {
        match self {
            Self::MissingField { field }
            | Self::TooLong { field, .. }
            | Self::InvalidCharacters { field, .. }
            | Self::InvalidEmail { field, .. }
            | Self::OutOfRange { field, .. } => field.as_str(),
        }
    }
}

/// Validation result type
pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

/// Request validator implementation
#[derive(Debug, Clone)]
pub struct RequestValidator {
    /// Maximum allowed field length
    max_field_length: usize,
}

impl Default for RequestValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestValidator {
    /// Create new validator
    pub fn new() -> Self {
        Self {
            max_field_length: 1_000,
        }
    }

    /// Require a non-blank value no longer than `max` (or the validator default)
    pub fn validate_required(
        &self,
        field: &str,
        value: &str,
        max: Option<usize>,
    ) -> ValidationResult<()> {
        if value.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: field.to_string(),
            });
        }

        let max = max.unwrap_or(self.max_field_length);
        let length = value.chars().count();
        if length > max {
            return Err(ValidationError::TooLong {
                field: field.to_string(),
                max,
                got: length,
            });
        }

        Ok(())
    }

    /// Validate email format
    pub fn validate_email(&self, field: &str, value: &str) -> ValidationResult<()> {
        self.validate_required(field, value, Some(254))?;
        if EMAIL_REGEX.is_match(value.trim()) {
            Ok(())
        } else {
            Err(ValidationError::InvalidEmail {
                field: field.to_string(),
                value: value.to_string(),
            })
        }
    }

    /// Validate that value contains only alphanumerics or the allowed extra characters
    pub fn validate_safe_chars(
        &self,
        field: &str,
        value: &str,
        allowed: &[char],
    ) -> ValidationResult<()> {
        let invalid: String = value
            .chars()
            .filter(|c| !c.is_alphanumeric() && !allowed.contains(c))
            .collect();

        if !invalid.is_empty() {
            Err(ValidationError::InvalidCharacters {
                field: field.to_string(),
                chars: invalid,
            })
        } else {
            Ok(())
        }
    }

    /// Validate an integer range (inclusive)
    pub fn validate_range(&self, field: &str, value: i64, min: i64, max: i64) -> ValidationResult<()> {
        if value < min || value > max {
            return Err(ValidationError::OutOfRange {
                field: field.to_string(),
                min,
                max,
                got: value,
            });
        }
        Ok(())
    }

    /// Sanitize string input
    pub fn sanitize_string(input: &str) -> String {
        // Remove null bytes and control characters
        input
            .trim()
            .chars()
            .filter(|c| !c.is_control())
            .collect()
    }
}

/// Common validation helpers
pub mod validators {
    use super::*;

    /// Validate username
    pub fn validate_username(username: &str) -> ValidationResult<()> {
        let validator = RequestValidator::new();
        validator.validate_required("username", username, Some(64))?;
        validator.validate_safe_chars("username", username.trim(), &['-', '_', '.'])
    }

    /// Validate email address
    pub fn validate_email(email: &str) -> ValidationResult<()> {
        RequestValidator::new().validate_email("email", email)
    }

    /// Validate search query
    pub fn validate_search_query(query: &str) -> ValidationResult<()> {
        RequestValidator::new().validate_required("search", query, Some(256))
    }

    /// Validate a result limit
    pub fn validate_limit(limit: u32, max: u32) -> ValidationResult<()> {
        RequestValidator::new().validate_range("limit", limit as i64, 1, max as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::validators::*;
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("alice", true)]
    #[case("bob.smith-99", true)]
    #[case("", false)]
    #[case("   ", false)]
    #[case("alice;drop", false)]
    fn test_username(#[case] username: &str, #[case] valid: bool) {
        assert_eq!(validate_username(username).is_ok(), valid);
    }

    #[rstest]
    #[case("a@x.com", true)]
    #[case("first.last+tag@mail.example.org", true)]
    #[case("not-an-email", false)]
    #[case("a@x", false)]
    #[case("", false)]
    fn test_email(#[case] email: &str, #[case] valid: bool) {
        assert_eq!(validate_email(email).is_ok(), valid);
    }

    #[test]
    fn test_missing_field_reports_field_name() {
        let err = validate_search_query("").unwrap_err();
        assert_eq!(err.field(), "search");
        assert!(matches!(err, ValidationError::MissingField { .. }));
    }

    #[test]
    fn test_limit_range() {
        assert!(validate_limit(1, 40).is_ok());
        assert!(validate_limit(40, 40).is_ok());
        assert!(matches!(
            validate_limit(0, 40),
            Err(ValidationError::OutOfRange { got: 0, .. })
        ));
        assert!(validate_limit(41, 40).is_err());
    }

    #[test]
    fn test_sanitize_string() {
        assert_eq!(RequestValidator::sanitize_string("  dune\0\n "), "dune");
    }
}
