//! # State Provider
//!
//! The live container: owns the current [`FormState`] snapshot, sequences
//! the pure transitions in [`crate::transition`], and runs the async submit
//! lifecycle.
//!
//! ## Concurrency
//!
//! `StateProvider` is a cheap cloneable handle. The snapshot lives behind a
//! `parking_lot::Mutex<Arc<FormState>>`. A mutator clones the current `Arc`,
//! computes its transition with the lock released, then swaps the pointer
//! only if the snapshot is still the one it started from; otherwise it
//! recomputes against the newer snapshot. `validate`, `warn`, renderers and
//! submit callbacks therefore never run under the lock and may read
//! [`StateProvider::state`]. The lock is never held across `.await`.
//!
//! A validator that itself mutates the provider it validates makes every
//! commit retry; validators should stay pure.
//!
//! ## Liveness
//!
//! [`StateProvider::unmount`] clears the liveness flag. From then on every
//! commit is dropped, including the deferred commit at the end of an
//! in-flight submit. Submit callbacks still fire exactly once, so anyone
//! awaiting the outcome is not starved.

use std::convert::Infallible;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use formwork_core::{FormError, FormValue, Path};

use crate::config::FormConfig;
use crate::state::FormState;
use crate::submit::{SubmitError, SubmitEvent};
use crate::transition;

struct Inner {
    state: Mutex<Arc<FormState>>,
    mounted: AtomicBool,
}

/// Handle to a mounted form state container.
///
/// Clones share the same state and liveness flag.
#[derive(Clone)]
pub struct StateProvider {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for StateProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateProvider")
            .field("mounted", &self.is_mounted())
            .field("state", &*self.inner.state.lock())
            .finish()
    }
}

impl StateProvider {
    /// Build the initial state from `config` and render it once.
    pub fn mount(config: impl Into<Arc<FormConfig>>) -> Self {
        let config = config.into();
        let state = Arc::new(transition::initial_state(&config));
        tracing::debug!(valid = state.is_valid(), "mounted form state");

        let provider = Self {
            inner: Arc::new(Inner {
                state: Mutex::new(Arc::clone(&state)),
                mounted: AtomicBool::new(true),
            }),
        };
        provider.render(&state);
        provider
    }

    /// Current snapshot.
    pub fn state(&self) -> Arc<FormState> {
        Arc::clone(&self.inner.state.lock())
    }

    /// Configuration the current snapshot was derived from.
    pub fn config(&self) -> Arc<FormConfig> {
        Arc::clone(self.inner.state.lock().props())
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.mounted.load(Ordering::Acquire)
    }

    /// Tear the container down. Idempotent.
    pub fn unmount(&self) {
        if self.inner.mounted.swap(false, Ordering::AcqRel) {
            tracing::debug!("unmounted form state");
        }
    }

    // ─── Configuration ──────────────────────────────────────────────

    /// Feed a (possibly) new configuration, as on a parent re-render.
    ///
    /// Returns `true` when a new snapshot was committed.
    pub fn receive_config(&self, config: impl Into<Arc<FormConfig>>) -> bool {
        let config = config.into();
        let before = self.state();
        let after = self.commit("deriveState", |current| {
            transition::derive_state(&config, current).unwrap_or_else(|| Arc::clone(current))
        });
        !Arc::ptr_eq(&before, &after)
    }

    // ─── Mutators ───────────────────────────────────────────────────

    /// Write a field value; re-runs validation and clears submit errors.
    ///
    /// Returns the snapshot after the operation.
    pub fn set_value(
        &self,
        path: &Path,
        value: impl Into<FormValue>,
    ) -> Result<Arc<FormState>, FormError> {
        let value = value.into();
        self.try_commit("setValue", |s| transition::set_value(s, path, value.clone()))
    }

    pub fn set_initial_value(
        &self,
        path: &Path,
        value: impl Into<FormValue>,
    ) -> Result<Arc<FormState>, FormError> {
        let value = value.into();
        self.try_commit("setInitialValue", |s| {
            transition::set_initial_value(s, path, value.clone())
        })
    }

    pub fn set_pending_value(
        &self,
        path: &Path,
        value: impl Into<FormValue>,
    ) -> Result<Arc<FormState>, FormError> {
        let value = value.into();
        self.try_commit("setPendingValue", |s| {
            transition::set_pending_value(s, path, value.clone())
        })
    }

    /// Move the pending value at `path` into the live values.
    pub fn accept_pending(&self, path: &Path) -> Result<Arc<FormState>, FormError> {
        self.try_commit("acceptPending", |s| transition::accept_pending(s, path))
    }

    pub fn set_visited(&self, field_key: &str, flag: bool) -> Result<Arc<FormState>, FormError> {
        self.try_commit("setVisited", |s| transition::set_visited(s, field_key, flag))
    }

    pub fn set_touched(&self, field_key: &str, flag: bool) -> Result<Arc<FormState>, FormError> {
        self.try_commit("setTouched", |s| transition::set_touched(s, field_key, flag))
    }

    pub fn set_focused(&self, field_key: &str, flag: bool) -> Result<Arc<FormState>, FormError> {
        self.try_commit("setFocused", |s| transition::set_focused(s, field_key, flag))
    }

    pub fn reset(&self) -> Arc<FormState> {
        self.commit("reset", transition::reset)
    }

    // ─── Submit ─────────────────────────────────────────────────────

    /// Suppress the event's default action, then [`submit`](Self::submit).
    pub fn submit_event(
        &self,
        event: &mut dyn SubmitEvent,
    ) -> impl Future<Output = Result<FormValue, SubmitError>> + Send + '_ {
        event.prevent_default();
        self.submit()
    }

    /// Run the submit lifecycle.
    ///
    /// Fails immediately, without touching state, when a submit is already
    /// in flight ([`SubmitError::Blocked`]) or when there are validation
    /// errors ([`SubmitError::Validation`] wrapping them). Otherwise enters
    /// the submitting state, awaits the handler, and commits the outcome if
    /// the provider is still mounted. The matching callback fires in every
    /// case.
    pub async fn submit(&self) -> Result<FormValue, SubmitError> {
        let started = {
            let mut guard = self.inner.state.lock();
            if guard.submitting {
                Err(SubmitError::Blocked)
            } else if let Some(errors) = &guard.error_state {
                Err(SubmitError::validation(errors.clone()))
            } else {
                let next = transition::begin_submit(&guard);
                if self.is_mounted() {
                    *guard = Arc::clone(&next);
                }
                Ok(next)
            }
        };

        let submitting = match started {
            Ok(next) => next,
            Err(err) => {
                tracing::warn!(error = %err, "submit rejected before handler");
                self.notify_failure(&err);
                return Err(err);
            }
        };
        if self.is_mounted() {
            self.render(&submitting);
        }

        tracing::info!("submit started");
        let values = submitting.value_state.clone();
        let outcome = match submitting.props().on_submit.clone() {
            Some(handler) => handler(values).await,
            None => Ok(values),
        };

        match outcome {
            Ok(result) => {
                self.commit("submitSucceeded", transition::submit_succeeded);
                tracing::info!("submit succeeded");
                if let Some(callback) = &self.config().on_submit_success {
                    callback(&result);
                }
                Ok(result)
            }
            Err(err) => {
                let submit_errors = match &err {
                    SubmitError::Validation(validation) => validation.normalized(),
                    _ => None,
                };
                self.commit("submitFailed", |s| {
                    transition::submit_failed(s, submit_errors.clone())
                });
                tracing::warn!(error = %err, "submit failed");
                self.notify_failure(&err);
                Err(err)
            }
        }
    }

    // ─── Internals ──────────────────────────────────────────────────

    fn notify_failure(&self, err: &SubmitError) {
        let config = self.config();
        let callback = if err.is_validation() {
            &config.on_submit_validation_fail
        } else {
            &config.on_submit_fail
        };
        if let Some(callback) = callback {
            callback(err);
        }
    }

    fn render(&self, state: &FormState) {
        if let Some(children) = &state.props().children {
            children(state);
        }
    }

    fn commit(
        &self,
        operation: &'static str,
        mut f: impl FnMut(&Arc<FormState>) -> Arc<FormState>,
    ) -> Arc<FormState> {
        match self.try_commit::<Infallible>(operation, |s| Ok(f(s))) {
            Ok(state) => state,
            Err(never) => match never {},
        }
    }

    /// Compute and store the next snapshot, then render it.
    ///
    /// `f` runs without the lock held and may run more than once: when
    /// another commit lands while it computes, it is re-run against the newer
    /// snapshot. Errors from `f` propagate even after unmount. Successful
    /// results are only stored while mounted; otherwise the current snapshot
    /// is kept.
    fn try_commit<E>(
        &self,
        operation: &'static str,
        mut f: impl FnMut(&Arc<FormState>) -> Result<Arc<FormState>, E>,
    ) -> Result<Arc<FormState>, E> {
        loop {
            let base = self.state();
            let next = f(&base)?;
            if Arc::ptr_eq(&base, &next) {
                return Ok(next);
            }

            let mut guard = self.inner.state.lock();
            if !Arc::ptr_eq(&guard, &base) {
                tracing::trace!(operation, "snapshot moved during transition, retrying");
                continue;
            }
            if !self.is_mounted() {
                tracing::debug!(operation, "provider unmounted, dropping commit");
                return Ok(Arc::clone(&guard));
            }
            *guard = Arc::clone(&next);
            drop(guard);

            self.render(&next);
            return Ok(next);
        }
    }
}
