//! Record type for stored documents.

use crate::document::{self, Document};
use crate::error::Error;
use rkyv::{Archive, Deserialize, Serialize};

/// One stored version of a document.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct Record {
    /// Name of the document's type.
    pub type_name: String,

    /// JSON encoded document body.
    pub data: Vec<u8>,

    /// Creation timestamp in microseconds since Unix epoch.
    pub created_at: u64,
}

impl Record {
    /// Create a record holding a document.
    pub fn new(type_name: impl Into<String>, doc: &Document) -> Result<Self, Error> {
        Ok(Self {
            type_name: type_name.into(),
            data: document::to_bytes(doc)?,
            created_at: super::key::current_timestamp(),
        })
    }

    /// Decode the document body.
    pub fn document(&self) -> Result<Document, Error> {
        document::from_bytes(&self.data)
    }

    /// Serialize the record to bytes using rkyv.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map(|v| v.to_vec())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize a record from bytes using rkyv.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        rkyv::from_bytes::<Self, rkyv::rancor::Error>(bytes)
            .map_err(|e| Error::Deserialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_document() {
        let doc = json!({ "name": "leaf" }).as_object().unwrap().clone();
        let record = Record::new("Leaf", &doc).unwrap();
        let decoded = Record::from_bytes(&record.to_bytes().unwrap()).unwrap();

        assert_eq!(decoded.type_name, "Leaf");
        assert_eq!(decoded.document().unwrap(), doc);
        assert!(decoded.created_at > 0);
    }
}
