//! # Form Definitions
//!
//! Declarative form documents (YAML or JSON) compiled into a [`FormConfig`].
//!
//! ```yaml
//! values:
//!   email: ""
//!   age: 17
//! rules:
//!   - field: email
//!     check: required
//!     message: Email is required
//! warnings:
//!   - field: age
//!     check: min
//!     value: 18
//!     message: Under 18
//! submit:
//!   outcome: reject
//!   errors:
//!     email: Already registered
//! ```
//!
//! A rule that fires writes its `message` at the rule's field path inside
//! the findings tree. The first firing rule for a field wins.

use std::path::Path as FsPath;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use formwork_core::{get, set, FormValue, Path, Seg, MAX_INDEX};
use formwork_state::{FormConfig, SubmitError, Validator};

/// A form document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormDefinition {
    /// Initial values.
    #[serde(default)]
    pub values: Value,
    /// Rules feeding `validate`.
    #[serde(default)]
    pub rules: Vec<Rule>,
    /// Rules feeding `warn`.
    #[serde(default)]
    pub warnings: Vec<Rule>,
    /// Scripted submit handler.
    #[serde(default)]
    pub submit: SubmitOutcome,
}

/// One declarative check on one field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    pub field: Path,
    pub check: CheckKind,
    /// Argument for checks that take one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    pub message: String,
}

/// Kinds of rule check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Required,
    MinLength,
    MaxLength,
    Min,
    Max,
    OneOf,
}

impl std::fmt::Display for CheckKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Required => "required",
            Self::MinLength => "min_length",
            Self::MaxLength => "max_length",
            Self::Min => "min",
            Self::Max => "max",
            Self::OneOf => "one_of",
        };
        f.write_str(s)
    }
}

/// How the scripted submit handler settles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case", deny_unknown_fields)]
pub enum SubmitOutcome {
    /// Resolve with `result`, or with the submitted values when absent.
    Resolve {
        #[serde(default)]
        result: Option<Value>,
    },
    /// Reject with a submit validation error carrying `errors`.
    Reject {
        #[serde(default)]
        errors: Value,
    },
    /// Reject with a generic failure.
    Fail { message: String },
}

impl Default for SubmitOutcome {
    fn default() -> Self {
        SubmitOutcome::Resolve { result: None }
    }
}

/// A rule with its argument checked and converted.
#[derive(Debug, Clone)]
enum Check {
    Required,
    MinLength(usize),
    MaxLength(usize),
    Min(f64),
    Max(f64),
    OneOf(Vec<FormValue>),
}

impl Check {
    fn compile(rule: &Rule) -> Result<Self> {
        let arg = || {
            rule.value
                .as_ref()
                .with_context(|| format!("rule {} on `{}` needs a `value`", rule.check, rule.field))
        };
        let length = || -> Result<usize> {
            let v = arg()?;
            v.as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .with_context(|| format!("rule {} expects a non-negative integer, got {v}", rule.check))
        };
        let number = || -> Result<f64> {
            let v = arg()?;
            v.as_f64()
                .with_context(|| format!("rule {} expects a number, got {v}", rule.check))
        };

        Ok(match rule.check {
            CheckKind::Required => Check::Required,
            CheckKind::MinLength => Check::MinLength(length()?),
            CheckKind::MaxLength => Check::MaxLength(length()?),
            CheckKind::Min => Check::Min(number()?),
            CheckKind::Max => Check::Max(number()?),
            CheckKind::OneOf => match arg()? {
                Value::Array(options) => {
                    Check::OneOf(options.iter().cloned().map(FormValue::from).collect())
                }
                other => bail!("rule one_of expects a list, got {other}"),
            },
        })
    }

    /// Whether the check fires (the field is in violation).
    fn fires(&self, value: Option<&FormValue>) -> bool {
        let len = |v: &FormValue| match v {
            FormValue::String(s) => Some(s.chars().count()),
            FormValue::List(items) => Some(items.len()),
            _ => None,
        };
        match (self, value) {
            (Check::Required, None) => true,
            (Check::Required, Some(v)) => match v {
                FormValue::Null => true,
                FormValue::String(s) => s.trim().is_empty(),
                FormValue::List(items) => items.is_empty(),
                _ => false,
            },
            // Absent values are the business of `required`.
            (_, None) | (_, Some(FormValue::Null)) => false,
            (Check::MinLength(min), Some(v)) => len(v).is_some_and(|n| n < *min),
            (Check::MaxLength(max), Some(v)) => len(v).is_some_and(|n| n > *max),
            (Check::Min(min), Some(v)) => v.as_f64().is_some_and(|n| n < *min),
            (Check::Max(max), Some(v)) => v.as_f64().is_some_and(|n| n > *max),
            (Check::OneOf(options), Some(v)) => !options.contains(v),
        }
    }
}

/// Compile rules into a validator producing a findings tree.
///
/// # Errors
///
/// Returns an error when a rule's argument is missing or has the wrong type,
/// or when its field indexes past [`MAX_INDEX`].
pub fn rules_validator(rules: &[Rule]) -> Result<Validator> {
    let compiled = rules
        .iter()
        .map(|rule| -> Result<_> {
            let oversized = rule.field.iter().filter_map(Seg::as_index).find(|i| *i > MAX_INDEX);
            if let Some(index) = oversized {
                bail!(
                    "rule on {} indexes past the list limit ({index} > {MAX_INDEX})",
                    rule.field
                );
            }
            let check = Check::compile(rule)?;
            Ok((rule.field.clone(), check, FormValue::from(rule.message.as_str())))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(formwork_state::validator(move |values| {
        let findings = compiled.iter().fold(FormValue::map(), |acc, (field, check, message)| {
            if get(&acc, field).is_some() || !check.fires(get(values, field)) {
                return acc;
            }
            // Field indices were bounded above, so the write cannot fail.
            set(&acc, field, message.clone()).unwrap_or(acc)
        });
        Some(findings)
    }))
}

impl FormDefinition {
    /// Load a definition from a `.json`, `.yaml` or `.yml` file.
    pub fn load(path: &FsPath) -> Result<Self> {
        crate::load_document(path)
    }

    /// Build the runtime configuration.
    ///
    /// `validate` and `warn` are only configured when there are rules for
    /// them.
    pub fn compile(&self) -> Result<FormConfig> {
        let mut config = FormConfig::new(self.values.clone());
        if !self.rules.is_empty() {
            config = config.validate_with(rules_validator(&self.rules).context("invalid rules")?);
        }
        if !self.warnings.is_empty() {
            config = config.warn_with(rules_validator(&self.warnings).context("invalid warnings")?);
        }

        let outcome = self.submit.clone();
        Ok(config.on_submit_sync(move |values| match &outcome {
            SubmitOutcome::Resolve { result: None } => Ok(values),
            SubmitOutcome::Resolve { result: Some(result) } => Ok(result.clone().into()),
            SubmitOutcome::Reject { errors } => Err(SubmitError::validation(errors.clone())),
            SubmitOutcome::Fail { message } => Err(SubmitError::msg(message.clone())),
        }))
    }
}
