//! # Field Paths
//!
//! A `Path` is an ordered sequence of segments locating a field inside a
//! value tree. Each segment is either a map key or a list index.
//!
//! ## Textual Form
//!
//! Keys are separated by dots and indices are bracketed:
//!
//! ```text
//! user.emails[0].address
//! ```
//!
//! A key containing `.`, `[`, `]` or `\` writes that character behind a
//! backslash (`a\.b` is the single key `a.b`), so every path round-trips
//! and distinct paths never share a textual form.
//!
//! The textual form doubles as the *field key* that the flat visited and
//! touched maps and the focused-field slot are keyed by.
//!
//! Indices are capped at [`MAX_INDEX`] so a write cannot pad a list without
//! bound.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PathError;

/// Largest index a write may pad a list out to.
pub const MAX_INDEX: usize = 65_535;

const ESCAPE: char = '\\';

fn needs_escape(c: char) -> bool {
    matches!(c, '.' | '[' | ']' | ESCAPE)
}

/// A single segment of a field path.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Seg {
    /// Map key access. Any string is a valid key; separators inside it are
    /// escaped in the textual form.
    Key(String),
    /// List index access.
    Index(usize),
}

impl Seg {
    /// Create a key segment.
    #[inline]
    pub fn key(k: impl Into<String>) -> Self {
        Seg::Key(k.into())
    }

    /// Create an index segment.
    #[inline]
    pub fn index(i: usize) -> Self {
        Seg::Index(i)
    }

    /// Get the key if this is a key segment.
    #[inline]
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Seg::Key(k) => Some(k),
            Seg::Index(_) => None,
        }
    }

    /// Get the index if this is an index segment.
    #[inline]
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Seg::Key(_) => None,
            Seg::Index(i) => Some(*i),
        }
    }
}

impl From<String> for Seg {
    fn from(s: String) -> Self {
        Seg::Key(s)
    }
}

impl From<&str> for Seg {
    fn from(s: &str) -> Self {
        Seg::Key(s.to_owned())
    }
}

impl From<usize> for Seg {
    fn from(i: usize) -> Self {
        Seg::Index(i)
    }
}

/// A path into a form value tree.
///
/// # Examples
///
/// ```
/// use formwork_core::Path;
///
/// let path = Path::root().key("user").index(0).key("name");
/// assert_eq!(path.len(), 3);
/// assert_eq!(path.to_string(), "user[0].name");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Path(Vec<Seg>);

impl Path {
    /// Create an empty path.
    #[inline]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Create a path from a vector of segments.
    #[inline]
    pub fn from_segments(segments: Vec<Seg>) -> Self {
        Self(segments)
    }

    /// Append a key segment (builder).
    #[inline]
    pub fn key(mut self, k: impl Into<String>) -> Self {
        self.0.push(Seg::Key(k.into()));
        self
    }

    /// Append an index segment (builder).
    #[inline]
    pub fn index(mut self, i: usize) -> Self {
        self.0.push(Seg::Index(i));
        self
    }

    /// Push a segment onto the path.
    #[inline]
    pub fn push(&mut self, seg: Seg) {
        self.0.push(seg);
    }

    #[inline]
    pub fn segments(&self) -> &[Seg] {
        &self.0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn last(&self) -> Option<&Seg> {
        self.0.last()
    }

    /// The path without its last segment, or `None` for the empty path.
    pub fn parent(&self) -> Option<Path> {
        let (_, rest) = self.0.split_last()?;
        Some(Path(rest.to_vec()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Seg> {
        self.0.iter()
    }

    /// Parse the textual form (`a.b[0].c`).
    ///
    /// # Errors
    ///
    /// Returns `PathError` for empty input, empty keys (`a..b`, `.a`, `a.`),
    /// unterminated brackets, non-numeric indices, indices above
    /// [`MAX_INDEX`] and a trailing unpaired backslash.
    pub fn parse(input: &str) -> Result<Self, PathError> {
        if input.is_empty() {
            return Err(PathError::Empty);
        }

        let malformed = |reason: &str| PathError::Malformed {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        let mut key = String::new();
        let mut chars = input.chars().peekable();
        // Whether the previous token closed an index, so `a[0].b` and `a[0][1]`
        // are accepted but `a[0]b` is not.
        let mut after_index = false;

        while let Some(c) = chars.next() {
            match c {
                '.' => {
                    if key.is_empty() && !after_index {
                        return Err(malformed("empty key segment"));
                    }
                    if !key.is_empty() {
                        segments.push(Seg::Key(std::mem::take(&mut key)));
                    }
                    after_index = false;
                    if chars.peek().is_none() {
                        return Err(malformed("trailing separator"));
                    }
                }
                '[' => {
                    if !key.is_empty() {
                        segments.push(Seg::Key(std::mem::take(&mut key)));
                    } else if segments.is_empty() {
                        return Err(malformed("index without a parent key"));
                    }
                    let mut digits = String::new();
                    let mut closed = false;
                    for d in chars.by_ref() {
                        if d == ']' {
                            closed = true;
                            break;
                        }
                        digits.push(d);
                    }
                    if !closed {
                        return Err(malformed("unterminated index"));
                    }
                    let index = digits
                        .parse::<usize>()
                        .map_err(|_| malformed("index is not a non-negative integer"))?;
                    if index > MAX_INDEX {
                        return Err(malformed("index exceeds the maximum of 65535"));
                    }
                    segments.push(Seg::Index(index));
                    after_index = true;
                }
                ']' => return Err(malformed("unexpected closing bracket")),
                ESCAPE => {
                    if after_index {
                        return Err(malformed("missing separator after index"));
                    }
                    let escaped = chars.next().ok_or_else(|| malformed("dangling escape"))?;
                    key.push(escaped);
                }
                other => {
                    if after_index {
                        return Err(malformed("missing separator after index"));
                    }
                    key.push(other);
                }
            }
        }

        if !key.is_empty() {
            segments.push(Seg::Key(key));
        }

        Ok(Self(segments))
    }
}

fn write_key(f: &mut fmt::Formatter<'_>, key: &str) -> fmt::Result {
    if !key.contains(needs_escape) {
        return f.write_str(key);
    }
    for c in key.chars() {
        if needs_escape(c) {
            write!(f, "{ESCAPE}")?;
        }
        write!(f, "{c}")?;
    }
    Ok(())
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.0.iter().enumerate() {
            match seg {
                Seg::Key(k) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    write_key(f, k)?;
                }
                Seg::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

impl TryFrom<String> for Path {
    type Error = PathError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Path::parse(&s)
    }
}

impl From<Path> for String {
    fn from(path: Path) -> Self {
        path.to_string()
    }
}

impl FromIterator<Seg> for Path {
    fn from_iter<I: IntoIterator<Item = Seg>>(iter: I) -> Self {
        Path(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Seg;
    type IntoIter = std::slice::Iter<'a, Seg>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Construct a `Path` from segments: string literals become keys, integers
/// become indices.
///
/// ```
/// use formwork_core::path;
///
/// let p = path!("items", 0, "name");
/// assert_eq!(p.to_string(), "items[0].name");
/// ```
#[macro_export]
macro_rules! path {
    () => {
        $crate::Path::root()
    };
    ($($seg:expr),+ $(,)?) => {{
        let mut p = $crate::Path::root();
        $(
            p.push($crate::Seg::from($seg));
        )+
        p
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_builder_and_display() {
        let path = Path::root().key("user").index(2).key("email");
        assert_eq!(path.len(), 3);
        assert_eq!(path.to_string(), "user[2].email");
    }

    #[test]
    fn test_path_macro_mixes_keys_and_indices() {
        let p = path!("items", 0, "name");
        assert_eq!(
            p.segments(),
            &[Seg::key("items"), Seg::index(0), Seg::key("name")]
        );
    }

    #[test]
    fn test_parse_round_trips_display() {
        for text in ["foo", "user.email", "items[3]", "a[0][1].b", "deep.nest[10].leaf"] {
            let path = Path::parse(text).unwrap();
            assert_eq!(path.to_string(), text);
        }
    }

    #[test]
    fn test_parse_rejects_empty_input() {
        assert_eq!(Path::parse(""), Err(PathError::Empty));
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        for text in [
            "a..b", ".a", "a.", "a[", "a[x]", "a[0]b", "[0]", "a]", "a\\", "a[0]\\.b",
        ] {
            let err = Path::parse(text).unwrap_err();
            assert!(
                matches!(err, PathError::Malformed { .. }),
                "{text:?} should be malformed, got {err:?}"
            );
        }
    }

    #[test]
    fn test_parse_rejects_index_above_limit() {
        assert_eq!(Path::parse("a[65535]").unwrap(), path!("a", MAX_INDEX));
        for text in ["a[65536]", "a[100000000000]", "a[18446744073709551615]"] {
            let err = Path::parse(text).unwrap_err();
            assert!(
                matches!(&err, PathError::Malformed { reason, .. } if reason.contains("maximum")),
                "{text:?} should exceed the index limit, got {err:?}"
            );
        }
    }

    #[test]
    fn test_keys_with_separators_are_escaped() {
        let dotted = path!("a.b");
        let nested = path!("a", "b");
        assert_eq!(dotted.to_string(), r"a\.b");
        assert_ne!(dotted.to_string(), nested.to_string());

        let odd = path!("x[0]", r"back\slash", 2, "tail.");
        assert_eq!(odd.to_string(), r"x\[0\].back\\slash[2].tail\.");
        for path in [dotted, nested, odd] {
            assert_eq!(Path::parse(&path.to_string()).unwrap(), path);
        }
    }

    #[test]
    fn test_escaped_path_serializes_as_text() {
        let path = path!("config", "log.level");
        let json = serde_json::to_string(&path).unwrap();
        let parsed: Path = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, path);
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn test_parent_drops_last_segment() {
        let path = path!("a", "b", 1);
        assert_eq!(path.parent(), Some(path!("a", "b")));
        assert_eq!(Path::root().parent(), None);
    }

    #[test]
    fn test_path_serializes_as_text() {
        let path = path!("user", "emails", 0);
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, r#""user.emails[0]""#);
        let parsed: Path = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, path);
    }
}
