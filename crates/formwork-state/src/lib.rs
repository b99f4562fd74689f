//! # formwork-state — Form State Container
//!
//! Owns the canonical state of one form: values, baseline and pending
//! values, validation errors and warnings, per-field visited/touched flags,
//! focus, and the submit lifecycle.
//!
//! ## Layers
//!
//! - **Snapshot** (`state.rs`): the immutable [`FormState`] record, with
//!   [`SubmitStatus`] and per-field [`FieldSnapshot`] views.
//!
//! - **Configuration** (`config.rs`): [`FormConfig`], the "props" a form is
//!   mounted with. Callables are `Arc<dyn Fn ..>` so their identity can be
//!   compared when configuration changes.
//!
//! - **Transitions** (`transition.rs`): pure functions from one snapshot to
//!   the next. A no-op returns the same `Arc`; a change replaces exactly the
//!   affected top-level fields.
//!
//! - **Provider** (`provider.rs`): [`StateProvider`], the live container that
//!   commits transitions, renders, and runs the async submit with a liveness
//!   flag guarding deferred commits.
//!
//! - **Submit outcomes** (`submit.rs`): [`SubmitError`] separates blocked,
//!   validation and generic failures.
//!
//! ## Example
//!
//! ```
//! use formwork_core::path;
//! use formwork_state::{FormConfig, StateProvider};
//! use serde_json::json;
//!
//! let form = StateProvider::mount(FormConfig::new(json!({"name": ""})));
//! let before = form.state();
//! let after = form.set_value(&path!("name"), "Ada").unwrap();
//! assert!(after.is_dirty());
//! assert!(after.visited_map.is_empty());
//! assert!(std::sync::Arc::ptr_eq(&before.visited_map, &after.visited_map));
//! ```

pub mod config;
pub mod provider;
pub mod state;
pub mod submit;
pub mod transition;

// ─── Configuration re-exports ───────────────────────────────────────

pub use config::{
    submit_handler, validator, FailureCallback, FormConfig, Renderer, SubmitFuture,
    SubmitHandler, SuccessCallback, Validator,
};

// ─── State re-exports ───────────────────────────────────────────────

pub use provider::StateProvider;
pub use state::{FieldFlags, FieldSnapshot, FormState, SubmitStatus};

// ─── Submit re-exports ──────────────────────────────────────────────

pub use submit::{SubmitError, SubmitEvent, SUBMIT_BLOCKED_MESSAGE};
