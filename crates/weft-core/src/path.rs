//! Dotted field paths
//!
//! A [`FieldPath`] addresses one field inside a structured form value, using
//! `.`-separated segments (`"email"`, `"address.city"`, `"items.0.name"`).
//! Numeric segments index into sequences.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Path used for errors that belong to the form as a whole rather than a field.
///
/// `$` cannot start a Rust identifier, so no derived field name collides with it.
pub const ROOT_PATH: &str = "$root";

/// Address of a field inside a form value.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath(String);

impl FieldPath {
    /// Create a path from its dotted string form.
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// The synthetic path that carries form-level errors.
    #[must_use]
    pub fn root() -> Self {
        Self(ROOT_PATH.to_string())
    }

    /// Whether this is the form-level path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0 == ROOT_PATH
    }

    /// Borrow the dotted string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate the non-empty segments of the path.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.').filter(|s| !s.is_empty())
    }

    /// First segment, i.e. the top-level field this path lives under.
    #[must_use]
    pub fn head(&self) -> Option<&str> {
        self.segments().next()
    }

    /// Extend the path with one more segment.
    #[must_use]
    pub fn join(&self, segment: impl AsRef<str>) -> Self {
        if self.0.is_empty() {
            Self(segment.as_ref().to_string())
        } else {
            Self(format!("{}.{}", self.0, segment.as_ref()))
        }
    }

    /// True when `self` equals `ancestor` or is nested below it.
    ///
    /// `"address.city"` is within `"address"`, but `"addressee"` is not.
    #[must_use]
    pub fn is_within(&self, ancestor: &FieldPath) -> bool {
        match self.0.strip_prefix(ancestor.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('.'),
            None => false,
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for FieldPath {
    fn from(path: String) -> Self {
        Self(path)
    }
}

impl From<&FieldPath> for FieldPath {
    fn from(path: &FieldPath) -> Self {
        path.clone()
    }
}

impl AsRef<str> for FieldPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for FieldPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}
