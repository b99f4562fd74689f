//! # Operation Scripts
//!
//! A script is an ordered list of operations replayed against a mounted
//! form. Each step names its operation with an `op` tag:
//!
//! ```yaml
//! steps:
//!   - op: set_focused
//!     field: email
//!   - op: set_value
//!     path: email
//!     value: ada@example.com
//!   - op: set_touched
//!     field: email
//!   - op: submit
//! ```
//!
//! Flag steps (`set_visited`, `set_touched`, `set_focused`) default `flag`
//! to `true`.

use std::path::Path as FsPath;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use formwork_core::Path;

/// An operation script document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Script {
    pub fn load(path: &FsPath) -> Result<Self> {
        crate::load_document(path)
    }
}

fn default_flag() -> bool {
    true
}

/// One scripted operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", deny_unknown_fields)]
pub enum Step {
    SetValue {
        path: Path,
        value: Value,
    },
    SetInitialValue {
        path: Path,
        value: Value,
    },
    SetPendingValue {
        path: Path,
        value: Value,
    },
    AcceptPending {
        path: Path,
    },
    SetVisited {
        field: String,
        #[serde(default = "default_flag")]
        flag: bool,
    },
    SetTouched {
        field: String,
        #[serde(default = "default_flag")]
        flag: bool,
    },
    SetFocused {
        field: String,
        #[serde(default = "default_flag")]
        flag: bool,
    },
    /// Re-render with new configuration values; callables are kept.
    UpdateValues {
        values: Value,
    },
    Submit,
    Reset,
    Unmount,
}

impl Step {
    /// The `op` tag of this step.
    pub fn op(&self) -> &'static str {
        match self {
            Step::SetValue { .. } => "set_value",
            Step::SetInitialValue { .. } => "set_initial_value",
            Step::SetPendingValue { .. } => "set_pending_value",
            Step::AcceptPending { .. } => "accept_pending",
            Step::SetVisited { .. } => "set_visited",
            Step::SetTouched { .. } => "set_touched",
            Step::SetFocused { .. } => "set_focused",
            Step::UpdateValues { .. } => "update_values",
            Step::Submit => "submit",
            Step::Reset => "reset",
            Step::Unmount => "unmount",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formwork_core::path;
    use serde_json::json;

    #[test]
    fn test_parse_every_step_kind() {
        let script: Script = serde_yaml::from_str(
            r#"
steps:
  - {op: set_value, path: "items[1].name", value: widget}
  - {op: set_initial_value, path: a, value: 1}
  - {op: set_pending_value, path: a, value: 2}
  - {op: accept_pending, path: a}
  - {op: set_visited, field: a}
  - {op: set_touched, field: a, flag: false}
  - {op: set_focused, field: a}
  - {op: update_values, values: {a: 3}}
  - op: submit
  - op: reset
  - op: unmount
"#,
        )
        .unwrap();

        let ops: Vec<_> = script.steps.iter().map(Step::op).collect();
        assert_eq!(
            ops,
            [
                "set_value",
                "set_initial_value",
                "set_pending_value",
                "accept_pending",
                "set_visited",
                "set_touched",
                "set_focused",
                "update_values",
                "submit",
                "reset",
                "unmount"
            ]
        );
        assert_eq!(
            script.steps[0],
            Step::SetValue {
                path: path!("items", 1, "name"),
                value: json!("widget")
            }
        );
        assert_eq!(
            script.steps[4],
            Step::SetVisited {
                field: "a".into(),
                flag: true
            }
        );
        assert_eq!(
            script.steps[5],
            Step::SetTouched {
                field: "a".into(),
                flag: false
            }
        );
    }

    #[test]
    fn test_json_scripts_parse_too() {
        let script: Script =
            serde_json::from_str(r#"{"steps": [{"op": "submit"}, {"op": "reset"}]}"#).unwrap();
        assert_eq!(script.steps, vec![Step::Submit, Step::Reset]);
    }

    #[test]
    fn test_bad_steps_are_rejected() {
        assert!(serde_yaml::from_str::<Script>("steps: [{op: explode}]").is_err());
        assert!(serde_yaml::from_str::<Script>("steps: [{op: set_value, path: a}]").is_err());
        assert!(serde_yaml::from_str::<Script>("steps: [{op: set_value, path: 'a..b', value: 1}]").is_err());
        assert!(serde_yaml::from_str::<Script>(
            "steps: [{op: set_pending_value, path: 'rows[18446744073709551615]', value: 1}]"
        )
        .is_err());
    }
}
