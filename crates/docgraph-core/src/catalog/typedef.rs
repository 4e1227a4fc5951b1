//! Document type definitions.

use super::field::FieldDef;
use super::relation::RelationDef;
use crate::document::IDENTITY_FIELD;
use crate::error::Error;
use rkyv::{Archive, Deserialize, Serialize};

/// A registered document type: its fields and outgoing relations.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct TypeDef {
    /// Type name (unique within a catalog).
    pub name: String,
    /// Field definitions in declaration order.
    pub fields: Vec<FieldDef>,
    /// Relations in declaration order.
    pub relations: Vec<RelationDef>,
}

impl TypeDef {
    /// Create an empty type definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            relations: Vec::new(),
        }
    }

    /// Add a field, replacing any field with the same name.
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.put_field(field);
        self
    }

    /// Add multiple fields.
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = FieldDef>) -> Self {
        for field in fields {
            self.put_field(field);
        }
        self
    }

    /// Add a relation.
    pub fn with_relation(mut self, relation: RelationDef) -> Self {
        self.relations.push(relation);
        self
    }

    /// Insert or replace a field in place. A replaced field keeps its position.
    pub fn put_field(&mut self, field: FieldDef) {
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
    }

    /// Get a field by name.
    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Name of the identity field.
    pub fn identity_field(&self) -> &'static str {
        IDENTITY_FIELD
    }

    /// Fields holding foreign keys.
    pub fn reference_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields
            .iter()
            .filter(|f| f.field_type.reference_target().is_some())
    }

    /// Get all indexed fields.
    pub fn indexed_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.indexed)
    }

    /// Serialize the definition to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map(|v| v.to_vec())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize a definition from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        rkyv::from_bytes::<Self, rkyv::rancor::Error>(bytes)
            .map_err(|e| Error::Deserialization(e.to_string()))
    }
}
