//! Field definitions for document types.

use super::types::{FieldType, ScalarType};
use crate::id::Id;
use rkyv::{Archive, Deserialize, Serialize};
use serde_json::Value;

/// A field definition within a document type.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name.
    pub name: String,
    /// Field data type.
    pub field_type: FieldType,
    /// Whether the field is required (non-null at the application level).
    pub required: bool,
    /// Default value if not provided.
    pub default: Option<DefaultValue>,
    /// Whether this field should be indexed.
    pub indexed: bool,
}

/// Default value for a field.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub enum DefaultValue {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// String value.
    String(String),
    /// Current timestamp (evaluated at save time).
    CurrentTimestamp,
    /// Freshly generated identity.
    AutoId,
}

/// Caller supplied options merged into a field definition.
///
/// These are the options accepted by `has(field, options)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldOptions {
    /// Mark the field required.
    pub required: bool,
    /// Mark the field indexed.
    pub indexed: bool,
    /// Default value.
    pub default: Option<DefaultValue>,
}

impl FieldDef {
    /// Create a new required field.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: true,
            default: None,
            indexed: false,
        }
    }

    /// Create an optional field (required = false).
    pub fn optional(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: false,
            default: None,
            indexed: false,
        }
    }

    /// Create an optional scalar field.
    pub fn optional_scalar(name: impl Into<String>, scalar: ScalarType) -> Self {
        Self::optional(name, FieldType::OptionalScalar(scalar))
    }

    /// Set the default value.
    pub fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    /// Mark as indexed.
    pub fn with_index(mut self) -> Self {
        self.indexed = true;
        self
    }

    /// Merge caller options into this definition.
    ///
    /// Options only ever switch flags on; a default replaces any existing one.
    pub fn with_options(mut self, options: &FieldOptions) -> Self {
        self.required |= options.required;
        self.indexed |= options.indexed;
        if let Some(default) = &options.default {
            self.default = Some(default.clone());
        }
        self
    }

    /// Check if this field has a default value.
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

impl DefaultValue {
    /// Evaluate the default into a JSON value.
    pub fn to_value(&self) -> Value {
        match self {
            DefaultValue::Null => Value::Null,
            DefaultValue::Bool(b) => Value::Bool(*b),
            DefaultValue::Int(i) => Value::from(*i),
            DefaultValue::Float(f) => Value::from(*f),
            DefaultValue::String(s) => Value::String(s.clone()),
            DefaultValue::CurrentTimestamp => {
                Value::from(crate::storage::key::current_timestamp())
            }
            DefaultValue::AutoId => Id::generate().to_value(),
        }
    }
}

impl FieldOptions {
    /// Options marking a field required.
    pub fn required() -> Self {
        Self {
            required: true,
            ..Default::default()
        }
    }

    /// Mark indexed.
    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    /// Set the default value.
    pub fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }
}
