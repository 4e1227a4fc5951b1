//! Core error types.

use thiserror::Error;

/// Core storage and catalog errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage layer error.
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Key decoding error.
    #[error("invalid key format")]
    InvalidKey,

    /// A value could not be read as a document identity.
    #[error("invalid identity: {0}")]
    InvalidId(String),

    /// A document does not satisfy its type definition.
    #[error("validation failed for {type_name}.{field}: {reason}")]
    Validation {
        /// Type being validated.
        type_name: String,
        /// Offending field.
        field: String,
        /// Human readable reason.
        reason: String,
    },
}

impl Error {
    /// Build a validation error.
    pub fn validation(
        type_name: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Error::Validation {
            type_name: type_name.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }
}
