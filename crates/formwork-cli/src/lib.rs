//! # formwork-cli — Scripted Form State Driver
//!
//! Provides the `formwork` command-line interface. It mounts a form from a
//! declarative definition, replays an operation script against the state
//! container, and prints the resulting state as JSON.
//!
//! ## Subcommands
//!
//! - `formwork run --form <FILE> [--script <FILE>]`: replay a script.
//! - `formwork check --form <FILE>`: print the initial state; exit 1 when
//!   the initial values are invalid.
//!
//! Documents ending in `.json` are read as JSON; anything else as YAML.

pub mod form;
pub mod run;
pub mod script;

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

/// Read and parse a YAML or JSON document, chosen by file extension.
pub fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse JSON document {}", path.display()))
    } else {
        serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse YAML document {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FormDefinition;
    use serde_json::json;

    #[test]
    fn load_document_picks_parser_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let yaml = dir.path().join("form.yaml");
        std::fs::write(&yaml, "values:\n  name: Ada\n").unwrap();
        let def: FormDefinition = load_document(&yaml).unwrap();
        assert_eq!(def.values, json!({"name": "Ada"}));

        let json_path = dir.path().join("form.JSON");
        std::fs::write(&json_path, r#"{"values": {"name": "Grace"}}"#).unwrap();
        let def: FormDefinition = load_document(&json_path).unwrap();
        assert_eq!(def.values, json!({"name": "Grace"}));
    }

    #[test]
    fn load_document_reports_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.yaml");
        let err = load_document::<FormDefinition>(&missing).unwrap_err();
        assert!(err.to_string().contains("missing.yaml"));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{").unwrap();
        let err = load_document::<FormDefinition>(&broken).unwrap_err();
        assert!(err.to_string().starts_with("failed to parse JSON document"));
    }
}
