//! Document representation.

use serde_json::{Map, Value};

use crate::error::Error;
use crate::id::Id;

/// Name of the identity field present on every stored document.
pub const IDENTITY_FIELD: &str = "id";

/// A document: a JSON object keyed by field name.
pub type Document = Map<String, Value>;

/// How a value relates to a foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceShape {
    /// `null` or missing.
    Null,
    /// An embedded object without an identity.
    Embedded,
    /// An embedded object that carries an identity.
    Identified(Id),
    /// A bare identity value.
    Bare(Id),
    /// Anything else (numbers, malformed strings, arrays).
    Other,
}

impl ReferenceShape {
    /// Classify a value.
    pub fn of(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => ReferenceShape::Null,
            Some(Value::Object(map)) => match map.get(IDENTITY_FIELD).and_then(Id::from_value_bare)
            {
                Some(id) => ReferenceShape::Identified(id),
                None => ReferenceShape::Embedded,
            },
            Some(v) => match Id::from_value_bare(v) {
                Some(id) => ReferenceShape::Bare(id),
                None => ReferenceShape::Other,
            },
        }
    }
}

/// Read the identity of a document, if it has a valid one.
pub fn document_id(doc: &Document) -> Option<Id> {
    doc.get(IDENTITY_FIELD).and_then(Id::from_value_bare)
}

/// Serialize a document to JSON bytes.
pub fn to_bytes(doc: &Document) -> Result<Vec<u8>, Error> {
    serde_json::to_vec(doc).map_err(|e| Error::Serialization(e.to_string()))
}

/// Deserialize a document from JSON bytes.
pub fn from_bytes(bytes: &[u8]) -> Result<Document, Error> {
    serde_json::from_slice(bytes).map_err(|e| Error::Deserialization(e.to_string()))
}
