//! # State Transitions
//!
//! Pure functions from one [`FormState`] snapshot to the next. They are the
//! whole of the container's semantics; the provider only sequences them and
//! commits the results.
//!
//! ## Identity Contract
//!
//! Every function taking `&Arc<FormState>` returns either
//!
//! - the **same** `Arc` (a no-op: the affected slice is unchanged under
//!   deep equality), or
//! - a **new** `Arc` in which only the affected top-level fields were
//!   replaced. Every other field is the same reference as before.
//!
//! No-op detection looks at the affected slice only. Path writes detect it
//! through [`formwork_core::set`], which hands back the original tree when
//! the target already holds an equal value.
//!
//! ## Configuration Changes
//!
//! [`derive_state`] compares `values`, `validate` and `warn` by reference
//! identity against the configuration cached in the state. It never
//! compares them deeply: a new closure that computes the same findings
//! still triggers a re-run, and an equal-but-rebuilt value tree still lands
//! in `pending_value_state`.

use std::collections::BTreeMap;
use std::sync::Arc;

use formwork_core::{get, normalize, set, FormError, FormValue, Path};

use crate::config::{same_callable, FormConfig, Validator};
use crate::state::{FieldFlags, FormState};

fn run_validator(validator: &Option<Validator>, values: &FormValue) -> Option<FormValue> {
    validator.as_ref().and_then(|f| normalize(f(values)))
}

fn empty_flags() -> FieldFlags {
    Arc::new(BTreeMap::new())
}

fn require_path(path: &Path, operation: &'static str) -> Result<(), FormError> {
    if path.is_empty() {
        return Err(FormError::empty_path(operation));
    }
    Ok(())
}

fn require_key(field_key: &str, operation: &'static str) -> Result<(), FormError> {
    if field_key.is_empty() {
        return Err(FormError::empty_path(operation));
    }
    Ok(())
}

/// Build the first snapshot from configuration.
///
/// `values` seeds the value, initial and pending trees (all three share the
/// same reference). `validate` and `warn` run once against those values.
pub fn initial_state(config: &Arc<FormConfig>) -> FormState {
    let values = config.values.clone();
    FormState {
        error_state: run_validator(&config.validate, &values),
        warning_state: run_validator(&config.warn, &values),
        value_state: values.clone(),
        initial_value_state: values.clone(),
        pending_value_state: values,
        submit_error_state: None,
        visited_map: empty_flags(),
        touched_map: empty_flags(),
        focused_path: None,
        submitting: false,
        submit_succeeded: false,
        submit_failed: false,
        props: Arc::clone(config),
    }
}

/// Re-derive state after the configuration may have changed.
///
/// Returns `None` when `next` is the very configuration the state was last
/// derived from; the caller must keep its state. Otherwise every detected
/// change lands in a single new snapshot:
///
/// - new `values` become `pending_value_state` (live values are untouched);
/// - a new `validate` re-runs against the live values into `error_state`;
/// - a new `warn` re-runs against the live values into `warning_state`;
/// - the cached configuration is refreshed.
pub fn derive_state(next: &Arc<FormConfig>, current: &Arc<FormState>) -> Option<Arc<FormState>> {
    let prev = &current.props;
    if Arc::ptr_eq(prev, next) {
        tracing::trace!("configuration unchanged");
        return None;
    }

    let mut state = FormState::clone(current);

    let values_changed = !next.values.same_ref(&prev.values);
    if values_changed {
        state.pending_value_state = next.values.clone();
    }

    let validate_changed = !same_callable(&next.validate, &prev.validate);
    if validate_changed {
        state.error_state = run_validator(&next.validate, &state.value_state);
    }

    let warn_changed = !same_callable(&next.warn, &prev.warn);
    if warn_changed {
        state.warning_state = run_validator(&next.warn, &state.value_state);
    }

    tracing::debug!(
        values_changed,
        validate_changed,
        warn_changed,
        "derived state from new configuration"
    );

    state.props = Arc::clone(next);
    Some(Arc::new(state))
}

/// Write a field value.
///
/// On change, `validate` and `warn` re-run against the new values and any
/// submit errors are cleared, since they describe values that no longer
/// exist.
///
/// # Errors
///
/// `FormError::EmptyPath` when `path` is empty, `FormError::IndexTooLarge`
/// when the write would pad a list past the index limit.
pub fn set_value(
    current: &Arc<FormState>,
    path: &Path,
    value: FormValue,
) -> Result<Arc<FormState>, FormError> {
    require_path(path, "setValue")?;

    let values = set(&current.value_state, path, value)?;
    if values.same_ref(&current.value_state) {
        tracing::trace!(%path, "setValue is a no-op");
        return Ok(Arc::clone(current));
    }

    tracing::debug!(%path, "setValue");
    let props = &current.props;
    Ok(Arc::new(FormState {
        error_state: run_validator(&props.validate, &values),
        warning_state: run_validator(&props.warn, &values),
        submit_error_state: None,
        value_state: values,
        ..FormState::clone(current)
    }))
}

/// Write a baseline value. No validation side effects.
///
/// # Errors
///
/// `FormError::EmptyPath` when `path` is empty, `FormError::IndexTooLarge`
/// when the write would pad a list past the index limit.
pub fn set_initial_value(
    current: &Arc<FormState>,
    path: &Path,
    value: FormValue,
) -> Result<Arc<FormState>, FormError> {
    require_path(path, "setInitialValue")?;

    let initial = set(&current.initial_value_state, path, value)?;
    if initial.same_ref(&current.initial_value_state) {
        tracing::trace!(%path, "setInitialValue is a no-op");
        return Ok(Arc::clone(current));
    }

    tracing::debug!(%path, "setInitialValue");
    Ok(Arc::new(FormState {
        initial_value_state: initial,
        ..FormState::clone(current)
    }))
}

/// Write a pending value. No validation side effects.
///
/// # Errors
///
/// `FormError::EmptyPath` when `path` is empty, `FormError::IndexTooLarge`
/// when the write would pad a list past the index limit.
pub fn set_pending_value(
    current: &Arc<FormState>,
    path: &Path,
    value: FormValue,
) -> Result<Arc<FormState>, FormError> {
    require_path(path, "setPendingValue")?;

    let pending = set(&current.pending_value_state, path, value)?;
    if pending.same_ref(&current.pending_value_state) {
        tracing::trace!(%path, "setPendingValue is a no-op");
        return Ok(Arc::clone(current));
    }

    tracing::debug!(%path, "setPendingValue");
    Ok(Arc::new(FormState {
        pending_value_state: pending,
        ..FormState::clone(current)
    }))
}

/// Reconcile the pending value at `path` into the live values.
///
/// Equivalent to `set_value(path, pending_at(path))`. A no-op when nothing
/// is pending at `path`.
///
/// # Errors
///
/// `FormError::EmptyPath` when `path` is empty.
pub fn accept_pending(current: &Arc<FormState>, path: &Path) -> Result<Arc<FormState>, FormError> {
    require_path(path, "acceptPending")?;

    match get(&current.pending_value_state, path) {
        Some(pending) => set_value(current, path, pending.clone()),
        None => Ok(Arc::clone(current)),
    }
}

/// `None` when the flag already holds `flag`.
fn set_flag(flags: &FieldFlags, field_key: &str, flag: bool) -> Option<FieldFlags> {
    if flags.get(field_key) == Some(&flag) {
        return None;
    }
    let mut next = BTreeMap::clone(flags);
    next.insert(field_key.to_string(), flag);
    Some(Arc::new(next))
}

/// Mark a field visited (or not).
///
/// # Errors
///
/// `FormError::EmptyPath` when `field_key` is empty.
pub fn set_visited(
    current: &Arc<FormState>,
    field_key: &str,
    flag: bool,
) -> Result<Arc<FormState>, FormError> {
    require_key(field_key, "setVisited")?;

    match set_flag(&current.visited_map, field_key, flag) {
        None => Ok(Arc::clone(current)),
        Some(visited) => {
            tracing::debug!(field = field_key, flag, "setVisited");
            Ok(Arc::new(FormState {
                visited_map: visited,
                ..FormState::clone(current)
            }))
        }
    }
}

/// Mark a field touched (or not).
///
/// # Errors
///
/// `FormError::EmptyPath` when `field_key` is empty.
pub fn set_touched(
    current: &Arc<FormState>,
    field_key: &str,
    flag: bool,
) -> Result<Arc<FormState>, FormError> {
    require_key(field_key, "setTouched")?;

    match set_flag(&current.touched_map, field_key, flag) {
        None => Ok(Arc::clone(current)),
        Some(touched) => {
            tracing::debug!(field = field_key, flag, "setTouched");
            Ok(Arc::new(FormState {
                touched_map: touched,
                ..FormState::clone(current)
            }))
        }
    }
}

/// Move focus to `field_key`, or release it.
///
/// Releasing only clears focus when `field_key` still holds it; if another
/// field already took focus, releasing is a no-op.
///
/// # Errors
///
/// `FormError::EmptyPath` when `field_key` is empty.
pub fn set_focused(
    current: &Arc<FormState>,
    field_key: &str,
    flag: bool,
) -> Result<Arc<FormState>, FormError> {
    require_key(field_key, "setFocused")?;

    let holds_focus = current.focused_path.as_deref() == Some(field_key);
    let focused_path = match (flag, holds_focus) {
        (true, true) | (false, false) => return Ok(Arc::clone(current)),
        (true, false) => Some(field_key.to_string()),
        (false, true) => None,
    };

    tracing::debug!(field = field_key, flag, "setFocused");
    Ok(Arc::new(FormState {
        focused_path,
        ..FormState::clone(current)
    }))
}

/// Restore values to the baseline and clear interaction and submit state.
///
/// Pending values are kept. Validation re-runs only if the live values
/// actually changed.
pub fn reset(current: &Arc<FormState>) -> Arc<FormState> {
    let values_at_rest = current.value_state.same_ref(&current.initial_value_state);
    let at_rest = values_at_rest
        && current.visited_map.is_empty()
        && current.touched_map.is_empty()
        && current.focused_path.is_none()
        && current.submit_error_state.is_none()
        && !current.submitting
        && !current.submit_succeeded
        && !current.submit_failed;
    if at_rest {
        return Arc::clone(current);
    }

    tracing::debug!("reset");
    let mut state = FormState {
        value_state: current.initial_value_state.clone(),
        submit_error_state: None,
        visited_map: empty_flags(),
        touched_map: empty_flags(),
        focused_path: None,
        submitting: false,
        submit_succeeded: false,
        submit_failed: false,
        ..FormState::clone(current)
    };
    if !values_at_rest {
        state.error_state = run_validator(&current.props.validate, &state.value_state);
        state.warning_state = run_validator(&current.props.warn, &state.value_state);
    }
    Arc::new(state)
}

/// Enter the in-flight submit state.
pub fn begin_submit(current: &Arc<FormState>) -> Arc<FormState> {
    Arc::new(FormState {
        submitting: true,
        submit_succeeded: false,
        submit_failed: false,
        ..FormState::clone(current)
    })
}

/// Terminal state after the handler resolved.
pub fn submit_succeeded(current: &Arc<FormState>) -> Arc<FormState> {
    Arc::new(FormState {
        submitting: false,
        submit_succeeded: true,
        submit_failed: false,
        submit_error_state: None,
        ..FormState::clone(current)
    })
}

/// Terminal state after the handler rejected. `submit_errors` must already
/// be normalized.
pub fn submit_failed(current: &Arc<FormState>, submit_errors: Option<FormValue>) -> Arc<FormState> {
    Arc::new(FormState {
        submitting: false,
        submit_succeeded: false,
        submit_failed: true,
        submit_error_state: submit_errors,
        ..FormState::clone(current)
    })
}
