//! # Run and Check Subcommands
//!
//! - `run` mounts a form, replays a script against it, and prints a JSON
//!   report with the outcome of every step and the final state.
//! - `check` mounts a form and prints its initial state. Exits 1 when the
//!   initial values have validation errors.
//!
//! Submit outcomes are data in the report, not command failures. Usage
//! errors in a step (an empty path, say) abort the run.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use serde_json::Value;

use formwork_core::{FormError, FormValue};
use formwork_state::{FormState, StateProvider, SubmitError};

use crate::form::FormDefinition;
use crate::script::{Script, Step};

/// Arguments for `formwork run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Form definition (YAML or JSON).
    #[arg(long)]
    pub form: PathBuf,

    /// Operation script (YAML or JSON). Without one, only mounts.
    #[arg(long)]
    pub script: Option<PathBuf>,

    /// Include the full state snapshot after every step.
    #[arg(long)]
    pub snapshots: bool,
}

/// Arguments for `formwork check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Form definition (YAML or JSON).
    #[arg(long)]
    pub form: PathBuf,
}

/// How a scripted submit settled.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitReport {
    Resolved { result: FormValue },
    Blocked { message: String },
    Invalid { errors: FormValue },
    Failed { message: String },
}

impl From<Result<FormValue, SubmitError>> for SubmitReport {
    fn from(outcome: Result<FormValue, SubmitError>) -> Self {
        match outcome {
            Ok(result) => SubmitReport::Resolved { result },
            Err(err @ SubmitError::Blocked) => SubmitReport::Blocked {
                message: err.to_string(),
            },
            Err(SubmitError::Validation(v)) => SubmitReport::Invalid {
                errors: v.errors().clone(),
            },
            Err(err @ SubmitError::Failed(_)) => SubmitReport::Failed {
                message: err.to_string(),
            },
        }
    }
}

/// Outcome of one replayed step.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub op: &'static str,
    /// Whether a new state snapshot was committed.
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submit: Option<SubmitReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<Value>,
}

/// Full output of `formwork run`.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub steps: Vec<StepReport>,
    pub mounted: bool,
    pub status: String,
    #[serde(rename = "final")]
    pub final_state: Value,
}

fn snapshot(state: &FormState) -> Result<Value> {
    serde_json::to_value(state).context("failed to serialize form state")
}

/// Replay `steps` against `provider`.
///
/// # Errors
///
/// Fails on the first step that raises a usage error.
pub async fn replay(
    provider: &StateProvider,
    steps: &[Step],
    snapshots: bool,
) -> Result<Vec<StepReport>> {
    let mut reports = Vec::with_capacity(steps.len());

    for (index, step) in steps.iter().enumerate() {
        let op = step.op();
        let before = provider.state();
        tracing::debug!(index, op, "replaying step");

        let mut submit = None;
        let applied: Result<(), FormError> = match step {
            Step::SetValue { path, value } => provider.set_value(path, value.clone()).map(drop),
            Step::SetInitialValue { path, value } => {
                provider.set_initial_value(path, value.clone()).map(drop)
            }
            Step::SetPendingValue { path, value } => {
                provider.set_pending_value(path, value.clone()).map(drop)
            }
            Step::AcceptPending { path } => provider.accept_pending(path).map(drop),
            Step::SetVisited { field, flag } => provider.set_visited(field, *flag).map(drop),
            Step::SetTouched { field, flag } => provider.set_touched(field, *flag).map(drop),
            Step::SetFocused { field, flag } => provider.set_focused(field, *flag).map(drop),
            Step::UpdateValues { values } => {
                provider.receive_config(provider.config().with_values(values.clone()));
                Ok(())
            }
            Step::Submit => {
                submit = Some(SubmitReport::from(provider.submit().await));
                Ok(())
            }
            Step::Reset => {
                provider.reset();
                Ok(())
            }
            Step::Unmount => {
                provider.unmount();
                Ok(())
            }
        };
        applied.with_context(|| format!("step {index} ({op}) failed"))?;

        let after = provider.state();
        reports.push(StepReport {
            index,
            op,
            changed: !Arc::ptr_eq(&before, &after),
            submit,
            state: snapshots.then(|| snapshot(&after)).transpose()?,
        });
    }

    Ok(reports)
}

/// Execute `formwork run`.
pub fn run_run(args: &RunArgs) -> Result<u8> {
    let definition = FormDefinition::load(&args.form)?;
    let config = definition
        .compile()
        .with_context(|| format!("invalid form definition {}", args.form.display()))?;
    let script = match &args.script {
        Some(path) => Script::load(path)?,
        None => Script::default(),
    };
    tracing::info!(steps = script.steps.len(), "loaded script");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let provider = StateProvider::mount(config);
    let steps = runtime.block_on(replay(&provider, &script.steps, args.snapshots))?;

    let state = provider.state();
    let report = RunReport {
        steps,
        mounted: provider.is_mounted(),
        status: state.submit_status().to_string(),
        final_state: snapshot(&state)?,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(0)
}

/// Execute `formwork check`.
pub fn run_check(args: &CheckArgs) -> Result<u8> {
    let definition = FormDefinition::load(&args.form)?;
    let config = definition
        .compile()
        .with_context(|| format!("invalid form definition {}", args.form.display()))?;

    let state = StateProvider::mount(config).state();
    println!("{}", serde_json::to_string_pretty(&snapshot(&state)?)?);

    if state.is_valid() {
        Ok(0)
    } else {
        tracing::warn!(form = %args.form.display(), "initial values have validation errors");
        Ok(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formwork_core::path;
    use formwork_state::FormConfig;
    use serde_json::json;

    fn steps(yaml: &str) -> Vec<Step> {
        serde_yaml::from_str::<Script>(yaml).unwrap().steps
    }

    fn provider(yaml: &str) -> StateProvider {
        let definition: FormDefinition = serde_yaml::from_str(yaml).unwrap();
        StateProvider::mount(definition.compile().unwrap())
    }

    #[tokio::test]
    async fn replay_reports_changes_and_noops() {
        let form = provider("values: {name: ''}");
        let reports = replay(
            &form,
            &steps(
                r#"
steps:
  - {op: set_value, path: name, value: Ada}
  - {op: set_value, path: name, value: Ada}
  - {op: set_touched, field: name}
"#,
            ),
            false,
        )
        .await
        .unwrap();

        let changed: Vec<_> = reports.iter().map(|r| r.changed).collect();
        assert_eq!(changed, [true, false, true]);
        assert!(reports.iter().all(|r| r.state.is_none()));
        assert_eq!(form.state().value_state, json!({"name": "Ada"}));
    }

    #[tokio::test]
    async fn replay_reports_submit_outcomes() {
        let form = provider(
            r#"
values: {email: ""}
rules:
  - {field: email, check: required, message: needed}
submit: {outcome: reject, errors: {email: taken}}
"#,
        );
        let reports = replay(
            &form,
            &steps(
                r#"
steps:
  - op: submit
  - {op: set_value, path: email, value: a@b.c}
  - op: submit
"#,
            ),
            true,
        )
        .await
        .unwrap();

        let invalid = serde_json::to_value(&reports[0].submit).unwrap();
        assert_eq!(invalid, json!({"outcome": "invalid", "errors": {"email": "needed"}}));
        assert!(!reports[0].changed);

        let rejected = serde_json::to_value(&reports[2].submit).unwrap();
        assert_eq!(rejected, json!({"outcome": "invalid", "errors": {"email": "taken"}}));
        let state = reports[2].state.as_ref().unwrap();
        assert_eq!(state["submitErrorState"], json!({"email": "taken"}));
        assert_eq!(state["submitFailed"], json!(true));
    }

    #[tokio::test]
    async fn replay_fails_on_usage_errors() {
        let form = provider("values: {}");
        let err = replay(&form, &steps("steps: [{op: set_touched, field: ''}]"), false)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "step 0 (set_touched) failed");
        assert!(format!("{err:#}").contains("setTouched requires a non-empty path"));
    }

    #[tokio::test]
    async fn update_values_lands_in_pending_and_can_be_accepted() {
        let form = provider("values: {plan: free}");
        let reports = replay(
            &form,
            &steps(
                r#"
steps:
  - {op: update_values, values: {plan: pro}}
  - {op: accept_pending, path: plan}
"#,
            ),
            false,
        )
        .await
        .unwrap();
        assert!(reports.iter().all(|r| r.changed));
        let state = form.state();
        assert_eq!(state.value_state, json!({"plan": "pro"}));
        assert_eq!(state.field(&path!("plan")).pending, Some("pro".into()));
    }

    #[tokio::test]
    async fn steps_after_unmount_do_not_change_state() {
        let form = StateProvider::mount(FormConfig::new(json!({"a": 1})));
        let reports = replay(
            &form,
            &steps("steps: [{op: unmount}, {op: set_value, path: a, value: 2}, {op: reset}]"),
            false,
        )
        .await
        .unwrap();
        assert!(reports.iter().all(|r| !r.changed));
        assert!(!form.is_mounted());
    }

    #[test]
    fn submit_report_from_blocked_keeps_message() {
        let report = SubmitReport::from(Err::<FormValue, _>(SubmitError::Blocked));
        let json = serde_json::to_value(report).unwrap();
        assert_eq!(
            json,
            json!({"outcome": "blocked", "message": "Form submit blocked pending current submit resolution."})
        );
    }
}
