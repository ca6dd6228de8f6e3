//! Error types for sextant
//!
//! Compilation itself never fails: every optional input field has a fixed
//! default. Errors only arise at the boundaries, when rendering compiled
//! output to text or when the caller hands over an object it cannot use.

use thiserror::Error;

/// Main error type for sextant operations
#[derive(Debug, Error)]
pub enum Error {
    /// Compiled output could not be rendered
    #[error("failed to serialize {kind}: {message}")]
    Serialization {
        /// The kind of output being serialized
        kind: String,
        /// Description of what failed
        message: String,
    },

    /// A source object that cannot be compiled
    #[error("validation error for {resource}: {message}")]
    Validation {
        /// `namespace/name` of the offending object
        resource: String,
        /// Description of what's invalid
        message: String,
    },
}

impl Error {
    /// Create a serialization error for output of `kind`
    pub fn serialization(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Serialization {
            kind: kind.into(),
            message: msg.into(),
        }
    }

    /// Create a validation error for a specific `namespace/name`
    pub fn validation(resource: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Validation {
            resource: resource.into(),
            message: msg.into(),
        }
    }
}
