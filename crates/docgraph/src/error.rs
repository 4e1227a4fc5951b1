//! Error types.
//!
//! [`Error`] is returned from fallible calls (compiling, saving, lookups).
//! [`MaterializeFailure`] is the diagnostic taxonomy of `merge_in` and
//! `expand_out`: those never return an error, every failure is reported
//! through `tracing` and traversal continues.

use docgraph_core::Id;
use thiserror::Error;
use tracing::warn;

/// docgraph errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage, catalog or validation error from the document engine.
    #[error(transparent)]
    Core(#[from] docgraph_core::Error),

    /// A model with this name is already registered.
    #[error("model already registered: {0}")]
    AlreadyRegistered(String),

    /// No model is registered under this name.
    #[error("unknown model: {0}")]
    UnknownModel(String),

    /// The model has no method with this name.
    #[error("model {type_name} has no method {method}")]
    UnknownMethod {
        /// Model name.
        type_name: String,
        /// Requested method.
        method: String,
    },

    /// The database backing a model has been dropped.
    #[error("database is closed")]
    DatabaseClosed,
}

/// A non-fatal failure while materializing references.
#[derive(Debug, Error)]
pub enum MaterializeFailure {
    /// The document engine rejected a save or a lookup.
    #[error("persisting {type_name}{} failed: {source}", describe_field(field))]
    Persistence {
        /// Type being saved or read.
        type_name: String,
        /// Reference field being processed; `None` for the instance itself.
        field: Option<String>,
        /// Underlying error.
        source: Error,
    },

    /// A referenced document (or its type) could not be found.
    #[error("reference '{field}' to {target} could not be resolved{}", describe_id(id))]
    UnresolvedReference {
        /// Reference field.
        field: String,
        /// Referenced type.
        target: String,
        /// Identity that was looked up, if the value carried one.
        id: Option<Id>,
    },

    /// A `null` entry inside a collection reference.
    #[error("collection '{field}' holds a null value at position {index}")]
    NullElement {
        /// Reference field.
        field: String,
        /// Position in the collection.
        index: usize,
    },
}

fn describe_field(field: &Option<String>) -> String {
    match field {
        Some(field) => format!(" for field '{}'", field),
        None => String::new(),
    }
}

fn describe_id(id: &Option<Id>) -> String {
    match id {
        Some(id) => format!(" (id {})", id),
        None => String::new(),
    }
}

impl MaterializeFailure {
    /// Report this failure on the diagnostic channel.
    pub fn report(&self) {
        match self {
            MaterializeFailure::Persistence {
                type_name,
                field,
                source,
            } => warn!(
                type_name = %type_name,
                field = ?field,
                error = %source,
                "Reference persistence failed"
            ),
            MaterializeFailure::UnresolvedReference { field, target, id } => warn!(
                field = %field,
                target = %target,
                id = ?id,
                "Reference could not be resolved"
            ),
            MaterializeFailure::NullElement { field, index } => {
                warn!(field = %field, index, "Null value in reference collection")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_messages() {
        let null = MaterializeFailure::NullElement {
            field: "leaves".into(),
            index: 2,
        };
        assert_eq!(
            null.to_string(),
            "collection 'leaves' holds a null value at position 2"
        );

        let missing = MaterializeFailure::UnresolvedReference {
            field: "leaf".into(),
            target: "Leaf".into(),
            id: None,
        };
        assert_eq!(missing.to_string(), "reference 'leaf' to Leaf could not be resolved");
    }

    #[test]
    fn test_persistence_message() {
        let failure = MaterializeFailure::Persistence {
            type_name: "Leaf".into(),
            field: Some("leaves".into()),
            source: Error::DatabaseClosed,
        };
        assert_eq!(
            failure.to_string(),
            "persisting Leaf for field 'leaves' failed: database is closed"
        );
    }

    #[test]
    fn test_core_error_is_transparent() {
        let err: Error = docgraph_core::Error::InvalidKey.into();
        assert_eq!(err.to_string(), "invalid key format");
    }
}
