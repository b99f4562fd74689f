//! # Error Types
//!
//! Usage errors are raised synchronously at the call site and never enter
//! form state. Validation findings are data, not errors, with one exception:
//! a submit handler reports field-addressable failures by returning a
//! [`SubmitValidationError`].

use thiserror::Error;

use crate::normalize::normalize;
use crate::value::FormValue;

/// Malformed textual path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The input string was empty.
    #[error("path must not be empty")]
    Empty,

    /// The input string could not be parsed.
    #[error("malformed path {input:?}: {reason}")]
    Malformed {
        /// The text that failed to parse.
        input: String,
        /// What was wrong with it.
        reason: String,
    },
}

/// Usage error from a form state operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    /// A mutator was called with an empty path or an empty field key.
    #[error("{operation} requires a non-empty path")]
    EmptyPath {
        /// The operation that rejected the path (e.g., "setValue").
        operation: &'static str,
    },

    /// A write would pad a list past the index limit.
    #[error("index {index} exceeds the maximum list index {limit}")]
    IndexTooLarge { index: usize, limit: usize },

    /// A textual path could not be parsed.
    #[error("invalid path: {0}")]
    Path(#[from] PathError),
}

impl FormError {
    /// Create an empty path error for `operation`.
    #[inline]
    pub fn empty_path(operation: &'static str) -> Self {
        FormError::EmptyPath { operation }
    }
}

/// Structured submit-time validation failure.
///
/// Raised by a submit handler to report per-field errors, as opposed to a
/// generic failure that is not addressable to any field. The carried mapping
/// may be empty; the state container normalizes it before storing it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("submit validation failed")]
pub struct SubmitValidationError {
    errors: FormValue,
}

impl SubmitValidationError {
    /// Wrap a per-field error mapping.
    pub fn new(errors: impl Into<FormValue>) -> Self {
        Self {
            errors: errors.into(),
        }
    }

    /// The error mapping as supplied.
    pub fn errors(&self) -> &FormValue {
        &self.errors
    }

    /// The error mapping normalized for storage: `None` when empty.
    pub fn normalized(&self) -> Option<FormValue> {
        normalize(Some(self.errors.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_path_display_names_operation() {
        let err = FormError::empty_path("setValue");
        assert_eq!(err.to_string(), "setValue requires a non-empty path");
    }

    #[test]
    fn test_index_too_large_display() {
        let err = FormError::IndexTooLarge {
            index: usize::MAX,
            limit: 65_535,
        };
        assert_eq!(
            err.to_string(),
            format!("index {} exceeds the maximum list index 65535", usize::MAX)
        );
    }

    #[test]
    fn test_path_error_converts_into_form_error() {
        let err: FormError = PathError::Empty.into();
        assert!(err.to_string().contains("path must not be empty"));
    }

    #[test]
    fn test_submit_validation_error_normalizes_empty_mapping() {
        let empty = SubmitValidationError::new(json!({}));
        assert_eq!(empty.normalized(), None);

        let populated = SubmitValidationError::new(json!({"email": "taken"}));
        assert_eq!(
            populated.normalized(),
            Some(FormValue::from(json!({"email": "taken"})))
        );
        assert_eq!(populated.errors(), &json!({"email": "taken"}));
    }
}
