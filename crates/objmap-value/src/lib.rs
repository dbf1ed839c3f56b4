#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # objmap-value
//!
//! Dynamic value model shared by mapping sources and destinations.
//!
//! Sources arrive as typed records, untyped associative maps, or JSON text;
//! all of them are represented by [`Value`] so the mapping engine can treat
//! them uniformly.

/// Serde and JSON bridges.
pub mod json;
/// Dot-delimited path resolution.
pub mod path;
/// Core value and record types.
pub mod value;

/// Path cursor over nested values.
pub use path::{Cursor, is_path, split_path};
/// Value primitives.
pub use value::{Object, Value};

use thiserror::Error;

/// Errors that can occur when working with values
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Conversion error in {context}: {message}")]
    Conversion { context: String, message: String },
}

impl Error {
    /// Build an invalid-path error with input path and parsing reason.
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Build a type mismatch error.
    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Build a conversion error with conversion context.
    pub fn conversion(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conversion {
            context: context.into(),
            message: message.into(),
        }
    }
}

/// Crate-local result type for value operations.
pub type Result<T> = std::result::Result<T, Error>;
