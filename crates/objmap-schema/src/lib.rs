//! # objmap-schema
//!
//! Type descriptors, descriptor loading, and inheritance/merge logic.
//!
//! A type descriptor is the ordered list of public properties of a type. The
//! mapping engine reads descriptors to enumerate destination properties,
//! validate configuration, and discover conventional correspondences.

pub mod inheritance;
pub mod loader;
pub mod model;
pub mod registry;

pub use loader::DescriptorLoader;
pub use model::{PropertyDescriptor, TypeDescriptor};
pub use registry::TypeRegistry;

use thiserror::Error;

/// Errors that can occur when working with type descriptors
#[derive(Error, Debug)]
pub enum Error {
    #[error("Type not found: {0}")]
    NotFound(String),

    #[error("Invalid descriptor format: {0}")]
    InvalidFormat(String),

    #[error("Inheritance error: {0}")]
    Inheritance(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
