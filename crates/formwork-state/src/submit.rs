//! # Submit Outcomes
//!
//! The error channel of the submit lifecycle. The shapes stay distinct so
//! consumers can render per-field errors apart from a generic failure
//! banner:
//!
//! - [`SubmitError::Blocked`]: a submit is already in flight.
//! - [`SubmitError::Validation`]: local validation errors, or a
//!   [`SubmitValidationError`] raised by the handler.
//! - [`SubmitError::Failed`]: any other handler failure.

use std::sync::Arc;

use thiserror::Error;

use formwork_core::SubmitValidationError;

/// Fixed message for a submit attempted while another is in flight.
pub const SUBMIT_BLOCKED_MESSAGE: &str = "Form submit blocked pending current submit resolution.";

/// Why a submit did not succeed.
#[derive(Error, Debug, Clone)]
pub enum SubmitError {
    /// A submit is already in flight. No state was changed.
    #[error("{}", SUBMIT_BLOCKED_MESSAGE)]
    Blocked,

    /// Field-addressable validation failure.
    #[error(transparent)]
    Validation(#[from] SubmitValidationError),

    /// Generic handler failure. Shared so observers see the original error.
    #[error("submit failed: {0}")]
    Failed(Arc<anyhow::Error>),
}

impl SubmitError {
    /// Wrap any error as a generic submit failure.
    pub fn failed(err: impl Into<anyhow::Error>) -> Self {
        SubmitError::Failed(Arc::new(err.into()))
    }

    /// Generic submit failure from a message.
    pub fn msg(message: impl std::fmt::Display + std::fmt::Debug + Send + Sync + 'static) -> Self {
        SubmitError::Failed(Arc::new(anyhow::Error::msg(message)))
    }

    /// Submit validation failure carrying `errors`.
    pub fn validation(errors: impl Into<formwork_core::FormValue>) -> Self {
        SubmitError::Validation(SubmitValidationError::new(errors))
    }

    /// Whether this error belongs on the validation-failure channel.
    pub fn is_validation(&self) -> bool {
        matches!(self, SubmitError::Blocked | SubmitError::Validation(_))
    }
}

impl From<anyhow::Error> for SubmitError {
    /// A `SubmitValidationError` travelling inside an `anyhow::Error` is
    /// recovered as [`SubmitError::Validation`]; everything else is generic.
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<SubmitValidationError>() {
            Ok(validation) => SubmitError::Validation(validation),
            Err(other) => SubmitError::Failed(Arc::new(other)),
        }
    }
}

/// Event-like object whose default action a submit suppresses.
pub trait SubmitEvent {
    fn prevent_default(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blocked_message_is_fixed() {
        assert_eq!(
            SubmitError::Blocked.to_string(),
            "Form submit blocked pending current submit resolution."
        );
    }

    #[test]
    fn test_anyhow_validation_error_is_recovered() {
        let err = anyhow::Error::new(SubmitValidationError::new(json!({"name": "taken"})));
        match SubmitError::from(err) {
            SubmitError::Validation(v) => assert_eq!(v.errors(), &json!({"name": "taken"})),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_other_anyhow_errors_are_generic() {
        let err = SubmitError::from(anyhow::anyhow!("network down"));
        assert!(matches!(err, SubmitError::Failed(_)));
        assert!(!err.is_validation());
        assert_eq!(err.to_string(), "submit failed: network down");
    }

    #[test]
    fn test_channel_classification() {
        assert!(SubmitError::Blocked.is_validation());
        assert!(SubmitError::validation(json!({})).is_validation());
        assert!(!SubmitError::msg("boom").is_validation());
    }
}
