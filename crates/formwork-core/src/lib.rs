//! # formwork-core — Foundational Types for Form State
//!
//! The leaf crate of the formwork workspace. It defines the value model that
//! every form state tree is built from, and the path-addressed primitives the
//! state container uses to update those trees.
//!
//! ## Key Design Principles
//!
//! 1. **Persistent value trees.** `FormValue` stores list, map and string
//!    payloads behind `Arc`. Cloning a tree is O(1) and an update rebuilds
//!    only the containers along the written path.
//!
//! 2. **Two notions of equality.** `==` is deep structural equality.
//!    `FormValue::same_ref` is reference identity for containers. The state
//!    container relies on the second to detect no-op writes cheaply.
//!
//! 3. **Idempotent writes.** `access::set` returns the original tree (same
//!    reference) when the target already holds a deeply-equal value.
//!
//! 4. **Bounded lists.** No write pads a list past `MAX_INDEX`; `set`
//!    reports `FormError::IndexTooLarge` instead.
//!
//! 5. **Absent, never empty.** `normalize` turns empty findings into `None`.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `formwork-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod access;
pub mod error;
pub mod normalize;
pub mod path;
pub mod value;

pub use access::{get, set, unset};
pub use error::{FormError, PathError, SubmitValidationError};
pub use normalize::normalize;
pub use path::{Path, Seg, MAX_INDEX};
pub use value::FormValue;
