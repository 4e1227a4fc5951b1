//! Relation definitions between document types.

use rkyv::{Archive, Deserialize, Serialize};

/// Cardinality of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Archive, Serialize, Deserialize)]
pub enum Cardinality {
    /// The field holds a single foreign key.
    One,
    /// The field holds an ordered collection of foreign keys.
    Many,
}

/// A resolved relation from a field of one type to another type.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub struct RelationDef {
    /// Resolved relation name.
    pub name: String,
    /// Field on the source type holding the foreign key(s).
    pub field: String,
    /// Name of the referenced type.
    pub target: String,
    /// Relation cardinality.
    pub cardinality: Cardinality,
}

impl RelationDef {
    /// Create a single-valued relation.
    pub fn one(
        name: impl Into<String>,
        field: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            field: field.into(),
            target: target.into(),
            cardinality: Cardinality::One,
        }
    }

    /// Create a collection relation.
    pub fn many(
        name: impl Into<String>,
        field: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            field: field.into(),
            target: target.into(),
            cardinality: Cardinality::Many,
        }
    }

    /// Check if this relation holds a collection.
    pub fn is_many(&self) -> bool {
        self.cardinality == Cardinality::Many
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_relation() {
        let rel = RelationDef::one("Leaf", "leaf", "Leaf");

        assert_eq!(rel.cardinality, Cardinality::One);
        assert_eq!(rel.field, "leaf");
        assert!(!rel.is_many());
    }

    #[test]
    fn test_many_relation() {
        let rel = RelationDef::many("RootLeaf", "leaves", "Leaf");

        assert!(rel.is_many());
        assert_eq!(rel.name, "RootLeaf");
    }
}
