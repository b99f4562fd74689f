//! # FormValue — Persistent Value Tree
//!
//! The JSON-shaped value model for field values, validation findings and
//! submit errors. String, list and map payloads live behind `Arc`, so a
//! clone is a pointer copy and two trees may share any subtree.
//!
//! ## Equality
//!
//! - `==` compares structure (deep equality).
//! - [`FormValue::same_ref`] compares identity: containers are the same only
//!   when they point at the same allocation; scalars compare by value.
//!
//! Update paths that leave a subtree untouched hand back the same `Arc`, so
//! identity survives across state transitions and downstream consumers can
//! skip work with a pointer comparison.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// A node in a form value tree.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum FormValue {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(Arc<str>),
    List(Arc<Vec<FormValue>>),
    Map(Arc<BTreeMap<String, FormValue>>),
}

impl FormValue {
    /// An empty map.
    pub fn map() -> Self {
        FormValue::Map(Arc::new(BTreeMap::new()))
    }

    /// An empty list.
    pub fn list() -> Self {
        FormValue::List(Arc::new(Vec::new()))
    }

    /// Build a map from `(key, value)` pairs.
    pub fn from_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<FormValue>,
    {
        FormValue::Map(Arc::new(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    /// Reference identity.
    ///
    /// Containers (and strings) are identical when they share an allocation.
    /// Null, booleans and numbers have no identity and compare by value.
    pub fn same_ref(&self, other: &FormValue) -> bool {
        match (self, other) {
            (FormValue::Null, FormValue::Null) => true,
            (FormValue::Bool(a), FormValue::Bool(b)) => a == b,
            (FormValue::Number(a), FormValue::Number(b)) => a == b,
            (FormValue::String(a), FormValue::String(b)) => Arc::ptr_eq(a, b) || a == b,
            (FormValue::List(a), FormValue::List(b)) => Arc::ptr_eq(a, b),
            (FormValue::Map(a), FormValue::Map(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Whether this value counts as "no findings".
    ///
    /// Null, booleans and numbers are empty. Strings, lists and maps are
    /// empty when they hold nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            FormValue::Null | FormValue::Bool(_) | FormValue::Number(_) => true,
            FormValue::String(s) => s.is_empty(),
            FormValue::List(items) => items.is_empty(),
            FormValue::Map(entries) => entries.is_empty(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FormValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FormValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FormValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FormValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FormValue]> {
        match self {
            FormValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, FormValue>> {
        match self {
            FormValue::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Look up a direct child of a map by key.
    pub fn get_key(&self, key: &str) -> Option<&FormValue> {
        self.as_map().and_then(|m| m.get(key))
    }

    /// Convert into a plain `serde_json::Value` (deep copy).
    pub fn to_json(&self) -> Value {
        match self {
            FormValue::Null => Value::Null,
            FormValue::Bool(b) => Value::Bool(*b),
            FormValue::Number(n) => Value::Number(n.clone()),
            FormValue::String(s) => Value::String(s.to_string()),
            FormValue::List(items) => Value::Array(items.iter().map(FormValue::to_json).collect()),
            FormValue::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for FormValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FormValue::Null,
            Value::Bool(b) => FormValue::Bool(b),
            Value::Number(n) => FormValue::Number(n),
            Value::String(s) => FormValue::String(Arc::from(s)),
            Value::Array(items) => {
                FormValue::List(Arc::new(items.into_iter().map(FormValue::from).collect()))
            }
            Value::Object(entries) => FormValue::Map(Arc::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, FormValue::from(v)))
                    .collect(),
            )),
        }
    }
}

impl From<FormValue> for Value {
    fn from(value: FormValue) -> Self {
        value.to_json()
    }
}

impl From<&str> for FormValue {
    fn from(s: &str) -> Self {
        FormValue::String(Arc::from(s))
    }
}

impl From<String> for FormValue {
    fn from(s: String) -> Self {
        FormValue::String(Arc::from(s))
    }
}

impl From<bool> for FormValue {
    fn from(b: bool) -> Self {
        FormValue::Bool(b)
    }
}

impl From<i64> for FormValue {
    fn from(n: i64) -> Self {
        FormValue::Number(Number::from(n))
    }
}

impl From<u64> for FormValue {
    fn from(n: u64) -> Self {
        FormValue::Number(Number::from(n))
    }
}

impl From<Vec<FormValue>> for FormValue {
    fn from(items: Vec<FormValue>) -> Self {
        FormValue::List(Arc::new(items))
    }
}

impl From<BTreeMap<String, FormValue>> for FormValue {
    fn from(entries: BTreeMap<String, FormValue>) -> Self {
        FormValue::Map(Arc::new(entries))
    }
}

impl PartialEq<Value> for FormValue {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (FormValue::Null, Value::Null) => true,
            (FormValue::Bool(a), Value::Bool(b)) => a == b,
            (FormValue::Number(a), Value::Number(b)) => a == b,
            (FormValue::String(a), Value::String(b)) => **a == **b,
            (FormValue::List(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x == y)
            }
            (FormValue::Map(a), Value::Object(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(k, v)| b.get(k).is_some_and(|other| v == other))
            }
            _ => false,
        }
    }
}

impl PartialEq<&str> for FormValue {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_conversion_is_lossless() {
        let doc = json!({"name": "Ada", "tags": ["a", "b"], "age": 36, "ok": true, "none": null});
        let value = FormValue::from(doc.clone());
        assert_eq!(value.to_json(), doc);
        assert_eq!(value, doc);
    }

    #[test]
    fn test_clone_shares_containers() {
        let value = FormValue::from(json!({"a": {"b": 1}}));
        let copy = value.clone();
        assert!(value.same_ref(&copy));
    }

    #[test]
    fn test_equal_but_distinct_containers_are_not_same_ref() {
        let a = FormValue::from(json!({"a": 1}));
        let b = FormValue::from(json!({"a": 1}));
        assert_eq!(a, b);
        assert!(!a.same_ref(&b));
    }

    #[test]
    fn test_scalars_compare_by_value_for_identity() {
        assert!(FormValue::from(3i64).same_ref(&FormValue::from(3i64)));
        assert!(FormValue::from("x").same_ref(&FormValue::from("x")));
        assert!(!FormValue::from(true).same_ref(&FormValue::from(false)));
        assert!(!FormValue::Null.same_ref(&FormValue::map()));
    }

    #[test]
    fn test_is_empty() {
        assert!(FormValue::Null.is_empty());
        assert!(FormValue::map().is_empty());
        assert!(FormValue::list().is_empty());
        assert!(FormValue::from("").is_empty());
        assert!(FormValue::from(false).is_empty());
        assert!(FormValue::from(7i64).is_empty());
        assert!(!FormValue::from("error").is_empty());
        assert!(!FormValue::from(json!({"foo": "error"})).is_empty());
        assert!(!FormValue::from(json!(["error"])).is_empty());
    }

    #[test]
    fn test_serializes_as_plain_json() {
        let value = FormValue::from_entries([("foo", "bar")]);
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"{"foo":"bar"}"#);
        let parsed: FormValue = serde_json::from_str(r#"{"foo":["bar"]}"#).unwrap();
        assert_eq!(parsed, json!({"foo": ["bar"]}));
    }
}
