//! # Form Configuration
//!
//! The external configuration a [`StateProvider`](crate::StateProvider) is
//! mounted with and later re-derived from. Callables are stored as
//! `Arc<dyn Fn ..>` so that *reference identity* is observable: the
//! derivation step re-runs `validate`/`warn` only when the callable itself
//! was swapped, never by comparing what it computes.
//!
//! ```
//! use formwork_state::{FormConfig, SubmitError};
//! use formwork_core::FormValue;
//! use serde_json::json;
//!
//! let config = FormConfig::new(json!({"email": ""}))
//!     .validate(|values: &FormValue| {
//!         let email = values.get_key("email").and_then(FormValue::as_str);
//!         email
//!             .filter(|e| e.is_empty())
//!             .map(|_| FormValue::from(json!({"email": "required"})))
//!     })
//!     .on_submit(|values| async move { Ok::<_, SubmitError>(values) });
//! assert!(config.validate.is_some());
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use formwork_core::FormValue;

use crate::state::FormState;
use crate::submit::SubmitError;

/// Validation or warning function: findings for the given values, or `None`.
pub type Validator = Arc<dyn Fn(&FormValue) -> Option<FormValue> + Send + Sync>;

/// Boxed future produced by a submit handler.
pub type SubmitFuture = Pin<Box<dyn Future<Output = Result<FormValue, SubmitError>> + Send>>;

/// Submit handler: receives the current values, settles with a result.
pub type SubmitHandler = Arc<dyn Fn(FormValue) -> SubmitFuture + Send + Sync>;

/// Called once per successful submit with the handler's result.
pub type SuccessCallback = Arc<dyn Fn(&FormValue) + Send + Sync>;

/// Called once per failed or blocked submit with the error.
pub type FailureCallback = Arc<dyn Fn(&SubmitError) + Send + Sync>;

/// Projection invoked on every render with the current snapshot.
pub type Renderer = Arc<dyn Fn(&FormState) + Send + Sync>;

/// Wrap a closure as a shareable [`Validator`].
pub fn validator<F>(f: F) -> Validator
where
    F: Fn(&FormValue) -> Option<FormValue> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap an async closure as a shareable [`SubmitHandler`].
pub fn submit_handler<F, Fut>(f: F) -> SubmitHandler
where
    F: Fn(FormValue) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<FormValue, SubmitError>> + Send + 'static,
{
    Arc::new(move |values| Box::pin(f(values)) as SubmitFuture)
}

/// Configuration ("props") for a form.
///
/// Cloning shares every callable, so a clone with only `values` replaced
/// keeps `validate` and `warn` referentially unchanged.
#[derive(Clone, Default)]
pub struct FormConfig {
    /// Source of initial values, and of pending values on later updates.
    pub values: FormValue,
    /// Produces the error findings for a value tree.
    pub validate: Option<Validator>,
    /// Produces the warning findings for a value tree.
    pub warn: Option<Validator>,
    /// Submit handler. When absent, submit resolves with the submitted values.
    pub on_submit: Option<SubmitHandler>,
    pub on_submit_success: Option<SuccessCallback>,
    /// Generic (non-validation) submit failures.
    pub on_submit_fail: Option<FailureCallback>,
    /// Blocked submits and validation failures, local or handler-reported.
    pub on_submit_validation_fail: Option<FailureCallback>,
    /// Render projection (`children(state)`).
    pub children: Option<Renderer>,
}

impl FormConfig {
    /// Configuration with the given initial values and nothing else.
    pub fn new(values: impl Into<FormValue>) -> Self {
        Self {
            values: values.into(),
            ..Self::default()
        }
    }

    pub fn validate<F>(self, f: F) -> Self
    where
        F: Fn(&FormValue) -> Option<FormValue> + Send + Sync + 'static,
    {
        self.validate_with(validator(f))
    }

    /// Use an existing validator, preserving its identity.
    pub fn validate_with(mut self, validate: Validator) -> Self {
        self.validate = Some(validate);
        self
    }

    pub fn warn<F>(self, f: F) -> Self
    where
        F: Fn(&FormValue) -> Option<FormValue> + Send + Sync + 'static,
    {
        self.warn_with(validator(f))
    }

    /// Use an existing warning function, preserving its identity.
    pub fn warn_with(mut self, warn: Validator) -> Self {
        self.warn = Some(warn);
        self
    }

    pub fn on_submit<F, Fut>(self, f: F) -> Self
    where
        F: Fn(FormValue) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<FormValue, SubmitError>> + Send + 'static,
    {
        self.on_submit_with(submit_handler(f))
    }

    pub fn on_submit_with(mut self, handler: SubmitHandler) -> Self {
        self.on_submit = Some(handler);
        self
    }

    /// Synchronous submit handler; the result settles immediately.
    pub fn on_submit_sync<F>(self, f: F) -> Self
    where
        F: Fn(FormValue) -> Result<FormValue, SubmitError> + Send + Sync + 'static,
    {
        self.on_submit(move |values| {
            let outcome = f(values);
            async move { outcome }
        })
    }

    pub fn on_submit_success<F>(mut self, f: F) -> Self
    where
        F: Fn(&FormValue) + Send + Sync + 'static,
    {
        self.on_submit_success = Some(Arc::new(f));
        self
    }

    pub fn on_submit_fail<F>(mut self, f: F) -> Self
    where
        F: Fn(&SubmitError) + Send + Sync + 'static,
    {
        self.on_submit_fail = Some(Arc::new(f));
        self
    }

    pub fn on_submit_validation_fail<F>(mut self, f: F) -> Self
    where
        F: Fn(&SubmitError) + Send + Sync + 'static,
    {
        self.on_submit_validation_fail = Some(Arc::new(f));
        self
    }

    pub fn children<F>(mut self, f: F) -> Self
    where
        F: Fn(&FormState) + Send + Sync + 'static,
    {
        self.children = Some(Arc::new(f));
        self
    }

    /// Same configuration with different `values`; all callables are shared.
    pub fn with_values(&self, values: impl Into<FormValue>) -> Self {
        Self {
            values: values.into(),
            ..self.clone()
        }
    }
}

impl fmt::Debug for FormConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormConfig")
            .field("values", &self.values)
            .field("validate", &self.validate.is_some())
            .field("warn", &self.warn.is_some())
            .field("on_submit", &self.on_submit.is_some())
            .field("on_submit_success", &self.on_submit_success.is_some())
            .field("on_submit_fail", &self.on_submit_fail.is_some())
            .field(
                "on_submit_validation_fail",
                &self.on_submit_validation_fail.is_some(),
            )
            .field("children", &self.children.is_some())
            .finish()
    }
}

/// Identity of two optional callables. Compares data pointers only; vtable
/// pointers for the same closure may differ across codegen units.
pub(crate) fn same_callable<T: ?Sized>(a: &Option<Arc<T>>, b: &Option<Arc<T>>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => {
            std::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clone_preserves_callable_identity() {
        let config = FormConfig::new(json!({"a": 1})).validate(|_| None);
        let clone = config.with_values(json!({"a": 2}));
        assert!(same_callable(&config.validate, &clone.validate));
        assert!(same_callable(&config.warn, &clone.warn));
        assert_eq!(clone.values, json!({"a": 2}));
    }

    #[test]
    fn test_rebuilt_closure_is_a_new_callable() {
        let a = FormConfig::new(json!({})).validate(|_| None);
        let b = FormConfig::new(json!({})).validate(|_| None);
        assert!(!same_callable(&a.validate, &b.validate));
    }

    #[test]
    fn test_shared_validator_keeps_identity_across_configs() {
        let shared = validator(|_| None);
        let a = FormConfig::new(json!({})).validate_with(Arc::clone(&shared));
        let b = FormConfig::new(json!({"x": 1})).validate_with(shared);
        assert!(same_callable(&a.validate, &b.validate));
    }

    #[test]
    fn test_debug_reports_configured_callables() {
        let config = FormConfig::new(json!({})).warn(|_| None);
        let debug = format!("{config:?}");
        assert!(debug.contains("warn: true"));
        assert!(debug.contains("validate: false"));
    }
}
