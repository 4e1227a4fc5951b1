//! Core type definitions for the catalog.

use rkyv::{Archive, Deserialize, Serialize};

/// Scalar data types a document field may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub enum ScalarType {
    /// Boolean value.
    Bool,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point.
    Float64,
    /// UTF-8 string.
    String,
    /// Timestamp (microseconds since Unix epoch).
    Timestamp,
    /// Document identity.
    Id,
    /// Any JSON value, unchecked.
    Json,
}

/// Field types - flat representation without recursion.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub enum FieldType {
    /// A scalar value.
    Scalar(ScalarType),
    /// An optional scalar value (nullable).
    OptionalScalar(ScalarType),
    /// An array of scalar values.
    ArrayScalar(ScalarType),
    /// A foreign key to a single document of another type.
    Reference {
        /// Name of the referenced type.
        target: String,
    },
    /// An ordered collection of foreign keys to another type.
    ReferenceArray {
        /// Name of the referenced type.
        target: String,
    },
}

impl ScalarType {
    /// Check if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ScalarType::Int32 | ScalarType::Int64 | ScalarType::Float64 | ScalarType::Timestamp
        )
    }

    /// Short name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            ScalarType::Bool => "bool",
            ScalarType::Int32 => "int32",
            ScalarType::Int64 => "int64",
            ScalarType::Float64 => "float64",
            ScalarType::String => "string",
            ScalarType::Timestamp => "timestamp",
            ScalarType::Id => "id",
            ScalarType::Json => "json",
        }
    }
}

impl FieldType {
    /// Create a scalar field type.
    pub fn scalar(scalar: ScalarType) -> Self {
        FieldType::Scalar(scalar)
    }

    /// Create an optional scalar field type.
    pub fn optional_scalar(scalar: ScalarType) -> Self {
        FieldType::OptionalScalar(scalar)
    }

    /// Create an array of scalars field type.
    pub fn array_scalar(scalar: ScalarType) -> Self {
        FieldType::ArrayScalar(scalar)
    }

    /// Create a single foreign key type.
    pub fn reference(target: impl Into<String>) -> Self {
        FieldType::Reference {
            target: target.into(),
        }
    }

    /// Create a foreign key collection type.
    pub fn reference_array(target: impl Into<String>) -> Self {
        FieldType::ReferenceArray {
            target: target.into(),
        }
    }

    /// Check if this type is nullable.
    pub fn is_nullable(&self) -> bool {
        matches!(
            self,
            FieldType::OptionalScalar(_) | FieldType::Reference { .. }
        )
    }

    /// Check if this type is an array.
    pub fn is_array(&self) -> bool {
        matches!(
            self,
            FieldType::ArrayScalar(_) | FieldType::ReferenceArray { .. }
        )
    }

    /// Name of the referenced type, for foreign key fields.
    pub fn reference_target(&self) -> Option<&str> {
        match self {
            FieldType::Reference { target } | FieldType::ReferenceArray { target } => Some(target),
            _ => None,
        }
    }

    /// Get the inner scalar type if this is a scalar-based type.
    pub fn scalar_type(&self) -> Option<&ScalarType> {
        match self {
            FieldType::Scalar(s) | FieldType::OptionalScalar(s) | FieldType::ArrayScalar(s) => {
                Some(s)
            }
            _ => None,
        }
    }
}
