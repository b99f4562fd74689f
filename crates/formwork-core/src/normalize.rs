//! Normalization of validation, warning and submit-error results.
//!
//! Every findings slot in form state is either absent or a non-empty tree.
//! Validators are free to return `None`, `Null`, `{}` or `[]` for "nothing
//! to report"; all of those collapse to `None` here.

use crate::value::FormValue;

/// Collapse empty findings to `None`.
pub fn normalize(result: Option<FormValue>) -> Option<FormValue> {
    result.filter(|findings| !findings.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_results_become_absent() {
        assert_eq!(normalize(None), None);
        assert_eq!(normalize(Some(FormValue::Null)), None);
        assert_eq!(normalize(Some(FormValue::from(json!({})))), None);
        assert_eq!(normalize(Some(FormValue::from(json!([])))), None);
        assert_eq!(normalize(Some(FormValue::from(false))), None);
    }

    #[test]
    fn test_findings_pass_through_unchanged() {
        let findings = FormValue::from(json!({"foo": "error"}));
        let normalized = normalize(Some(findings.clone())).unwrap();
        assert!(normalized.same_ref(&findings));
    }
}
