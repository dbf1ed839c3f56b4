//! Dot-delimited path resolution over nested values
//!
//! A path such as `customer.contactInfo.email` walks object fields; a purely
//! numeric segment (`lines.0.sku`) indexes into lists.

use crate::value::Value;
use crate::{Error, Result};

/// Separator between path segments
pub const PATH_SEPARATOR: char = '.';

/// Returns true when the property reference is a nested path rather than a
/// plain property name.
pub fn is_path(reference: &str) -> bool {
    reference.contains(PATH_SEPARATOR)
}

/// Split a path into its segments.
///
/// # Errors
///
/// Returns an error when the path is empty or contains an empty segment.
pub fn split_path(path: &str) -> Result<Vec<&str>> {
    if path.is_empty() {
        return Err(Error::invalid_path(path, "path is empty"));
    }
    let segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(Error::invalid_path(path, "empty path segment"));
    }
    Ok(segments)
}

/// A cursor for navigating nested values
pub struct Cursor<'a> {
    /// Current value
    value: &'a Value,

    /// Segments walked so far (for error reporting)
    path: Vec<String>,
}

impl<'a> Cursor<'a> {
    /// Create a new cursor at the given value
    pub fn new(value: &'a Value) -> Self {
        Self {
            value,
            path: Vec::new(),
        }
    }

    /// Get the current value
    #[must_use]
    pub fn value(&self) -> &'a Value {
        self.value
    }

    /// Get the path walked so far
    #[must_use]
    pub fn path(&self) -> String {
        self.path.join(".")
    }

    /// Navigate to a field of an object, or an element of a list when the
    /// segment is numeric.
    ///
    /// # Errors
    ///
    /// Returns an error when the segment does not exist below the current value.
    pub fn child(&self, segment: &str) -> Result<Cursor<'a>> {
        let next = match self.value {
            Value::Object(object) => object.get(segment),
            Value::List(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };

        match next {
            Some(value) => {
                let mut path = self.path.clone();
                path.push(segment.to_string());
                Ok(Cursor { value, path })
            }
            None => {
                let walked = self.path();
                let full = if walked.is_empty() {
                    segment.to_string()
                } else {
                    format!("{walked}.{segment}")
                };
                Err(Error::invalid_path(
                    full,
                    format!("no '{segment}' below {}", self.value.kind()),
                ))
            }
        }
    }

    /// Navigate along a dot-delimited path
    ///
    /// # Errors
    ///
    /// Returns an error when the path is malformed or any segment is missing.
    pub fn descend(&self, path: &str) -> Result<Cursor<'a>> {
        let mut cursor = Cursor {
            value: self.value,
            path: self.path.clone(),
        };
        for segment in split_path(path)? {
            cursor = cursor.child(segment)?;
        }
        Ok(cursor)
    }
}

impl Value {
    /// Resolve a dot-delimited path. Missing segments yield `None`.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        Cursor::new(self).descend(path).ok().map(|c| c.value())
    }

    /// Check whether a path resolves to a present value (which may be `Null`).
    pub fn has_path(&self, path: &str) -> bool {
        self.get_path(path).is_some()
    }
}
