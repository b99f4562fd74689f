//! # Path-Addressed Access
//!
//! Immutable `get`/`set`/`unset` over [`FormValue`] trees.
//!
//! `set` and `unset` never touch the input tree. They rebuild the containers
//! on the path from the root to the target and share every sibling subtree
//! with the original. When the write would not change anything, the original
//! tree itself is returned (same reference), which is how idempotent writes
//! surface as no-ops in the state container.
//!
//! ```
//! use formwork_core::{path, set, FormValue};
//! use serde_json::json;
//!
//! let tree = FormValue::from(json!({"user": {"name": "Ada"}, "tags": ["x"]}));
//! let next = set(&tree, &path!("user", "name"), "Grace".into())?;
//!
//! assert_eq!(next, json!({"user": {"name": "Grace"}, "tags": ["x"]}));
//! // Untouched siblings are shared, not copied.
//! assert!(next.get_key("tags").unwrap().same_ref(tree.get_key("tags").unwrap()));
//! // Writing the same value again is a no-op.
//! assert!(set(&next, &path!("user", "name"), "Grace".into())?.same_ref(&next));
//! # Ok::<(), formwork_core::FormError>(())
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::FormError;
use crate::path::{Path, Seg, MAX_INDEX};
use crate::value::FormValue;

/// Read the value at `path`. `None` when any segment is missing.
pub fn get<'a>(tree: &'a FormValue, path: &Path) -> Option<&'a FormValue> {
    path.iter().try_fold(tree, |current, seg| match (seg, current) {
        (Seg::Key(key), FormValue::Map(entries)) => entries.get(key),
        (Seg::Index(idx), FormValue::List(items)) => items.get(*idx),
        _ => None,
    })
}

/// Return a tree with `value` at `path`.
///
/// Missing intermediates are created: a key segment creates a map, an index
/// segment creates a list padded with `Null` up to the index. A scalar in
/// the way of a container is replaced. An empty path replaces the whole tree.
///
/// # Errors
///
/// Returns [`FormError::IndexTooLarge`] when an index segment past the end
/// of its list exceeds [`MAX_INDEX`]. Existing elements can always be
/// overwritten.
pub fn set(tree: &FormValue, path: &Path, value: FormValue) -> Result<FormValue, FormError> {
    set_segments(Some(tree), path.segments(), value)
}

/// Return a tree without the entry at `path`.
///
/// Removing a missing entry returns the original tree. Removing a list
/// element shifts later elements down. An empty path yields `Null`.
pub fn unset(tree: &FormValue, path: &Path) -> FormValue {
    match unset_segments(tree, path.segments()) {
        Some(next) => next,
        None => tree.clone(),
    }
}

fn set_segments(
    current: Option<&FormValue>,
    segments: &[Seg],
    value: FormValue,
) -> Result<FormValue, FormError> {
    match segments {
        [] => Ok(match current {
            Some(existing) if *existing == value => existing.clone(),
            _ => value,
        }),
        [Seg::Key(key), rest @ ..] => {
            let entries = match current {
                Some(FormValue::Map(entries)) => Some(entries),
                _ => None,
            };
            let child = entries.and_then(|m| m.get(key));
            let next = set_segments(child, rest, value)?;

            if let (Some(entries), Some(child)) = (entries, child) {
                if child.same_ref(&next) {
                    return Ok(FormValue::Map(Arc::clone(entries)));
                }
            }

            // Shallow copy: children are `Arc`-backed so this clones pointers.
            let mut rebuilt: BTreeMap<String, FormValue> =
                entries.map(|m| (**m).clone()).unwrap_or_default();
            rebuilt.insert(key.clone(), next);
            Ok(FormValue::Map(Arc::new(rebuilt)))
        }
        [Seg::Index(idx), rest @ ..] => {
            let items = match current {
                Some(FormValue::List(items)) => Some(items),
                _ => None,
            };
            let child = items.and_then(|l| l.get(*idx));
            if child.is_none() && *idx > MAX_INDEX {
                return Err(FormError::IndexTooLarge {
                    index: *idx,
                    limit: MAX_INDEX,
                });
            }
            let next = set_segments(child, rest, value)?;

            if let (Some(items), Some(child)) = (items, child) {
                if child.same_ref(&next) {
                    return Ok(FormValue::List(Arc::clone(items)));
                }
            }

            let mut rebuilt: Vec<FormValue> = items.map(|l| (**l).clone()).unwrap_or_default();
            if *idx >= rebuilt.len() {
                // Bounded by MAX_INDEX above.
                rebuilt.resize(*idx + 1, FormValue::Null);
            }
            rebuilt[*idx] = next;
            Ok(FormValue::List(Arc::new(rebuilt)))
        }
    }
}

/// `None` means "nothing removed"; the caller keeps its original reference.
fn unset_segments(current: &FormValue, segments: &[Seg]) -> Option<FormValue> {
    match segments {
        [] => Some(FormValue::Null),
        [Seg::Key(key), rest @ ..] => {
            let FormValue::Map(entries) = current else {
                return None;
            };
            let child = entries.get(key)?;
            let mut rebuilt = (**entries).clone();
            if rest.is_empty() {
                rebuilt.remove(key);
            } else {
                let next = unset_segments(child, rest)?;
                rebuilt.insert(key.clone(), next);
            }
            Some(FormValue::Map(Arc::new(rebuilt)))
        }
        [Seg::Index(idx), rest @ ..] => {
            let FormValue::List(items) = current else {
                return None;
            };
            let child = items.get(*idx)?;
            let mut rebuilt = (**items).clone();
            if rest.is_empty() {
                rebuilt.remove(*idx);
            } else {
                let next = unset_segments(child, rest)?;
                rebuilt[*idx] = next;
            }
            Some(FormValue::List(Arc::new(rebuilt)))
        }
    }
}
