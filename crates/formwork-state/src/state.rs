//! # Form State Snapshot
//!
//! `FormState` is the immutable record every consumer reads. Transitions
//! never mutate a snapshot; they build a new one that reuses every field
//! they did not touch (see [`crate::transition`]).
//!
//! ## Submit Lifecycle
//!
//! ```text
//! Idle ──submit()──▶ Submitting ──resolve──▶ Succeeded
//!                        │                       │
//!                        └──reject──▶ Failed     │
//!                                       │        │
//!                                       └─submit()──▶ Submitting
//! ```
//!
//! The three boolean flags are kept for consumers; [`SubmitStatus`] is the
//! typed view of the same information, with exactly one variant holding.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use formwork_core::{get, FormValue, Path};

use crate::config::FormConfig;

/// Flat boolean map keyed by field key (textual path).
pub type FieldFlags = Arc<BTreeMap<String, bool>>;

/// Canonical form state.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormState {
    /// Current field values.
    pub value_state: FormValue,
    /// Baseline values used for dirty checks.
    pub initial_value_state: FormValue,
    /// Values supplied by configuration that have not been reconciled yet.
    pub pending_value_state: FormValue,
    /// Validation errors; `None` means no errors.
    pub error_state: Option<FormValue>,
    /// Non-blocking warnings; `None` means none.
    pub warning_state: Option<FormValue>,
    /// Field errors reported by the submit handler.
    pub submit_error_state: Option<FormValue>,
    pub visited_map: FieldFlags,
    pub touched_map: FieldFlags,
    /// Field key of the focused field.
    pub focused_path: Option<String>,
    pub submitting: bool,
    pub submit_succeeded: bool,
    pub submit_failed: bool,
    /// Configuration this state was last derived from.
    #[serde(skip)]
    pub(crate) props: Arc<FormConfig>,
}

impl FormState {
    /// The configuration this state was last derived from.
    pub fn props(&self) -> &Arc<FormConfig> {
        &self.props
    }

    pub fn submit_status(&self) -> SubmitStatus {
        if self.submitting {
            SubmitStatus::Submitting
        } else if self.submit_succeeded {
            SubmitStatus::Succeeded
        } else if self.submit_failed {
            SubmitStatus::Failed
        } else {
            SubmitStatus::Idle
        }
    }

    /// No validation errors.
    pub fn is_valid(&self) -> bool {
        self.error_state.is_none()
    }

    /// Value tree differs from the initial values.
    pub fn is_dirty(&self) -> bool {
        !self.value_state.same_ref(&self.initial_value_state)
            && self.value_state != self.initial_value_state
    }

    pub fn is_visited(&self, field_key: &str) -> bool {
        self.visited_map.get(field_key).copied().unwrap_or(false)
    }

    pub fn is_touched(&self, field_key: &str) -> bool {
        self.touched_map.get(field_key).copied().unwrap_or(false)
    }

    /// Read-only slice of the state for a single field.
    pub fn field(&self, path: &Path) -> FieldSnapshot {
        let key = path.to_string();
        let value = get(&self.value_state, path).cloned();
        let initial = get(&self.initial_value_state, path).cloned();
        let dirty = value != initial;
        let find = |slot: &Option<FormValue>| slot.as_ref().and_then(|t| get(t, path)).cloned();

        FieldSnapshot {
            pending: get(&self.pending_value_state, path).cloned(),
            error: find(&self.error_state),
            warning: find(&self.warning_state),
            submit_error: find(&self.submit_error_state),
            visited: self.is_visited(&key),
            touched: self.is_touched(&key),
            focused: self.focused_path.as_deref() == Some(key.as_str()),
            dirty,
            value,
            initial,
        }
    }
}

/// Typed view of the submit flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubmitStatus {
    /// No submit has run yet.
    Idle,
    /// A submit handler is in flight.
    Submitting,
    /// The last submit resolved.
    Succeeded,
    /// The last submit was rejected.
    Failed,
}

impl std::fmt::Display for SubmitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "IDLE",
            Self::Submitting => "SUBMITTING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// What a field-level consumer sees for one path.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSnapshot {
    pub value: Option<FormValue>,
    pub initial: Option<FormValue>,
    pub pending: Option<FormValue>,
    pub error: Option<FormValue>,
    pub warning: Option<FormValue>,
    pub submit_error: Option<FormValue>,
    pub visited: bool,
    pub touched: bool,
    pub focused: bool,
    pub dirty: bool,
}
