//! Document validation against a type definition.
//!
//! Validation runs on every save. It checks required fields and that each
//! declared field holds a value of its declared type; fields the type does
//! not declare are stored as they are.

use serde_json::Value;

use crate::catalog::{FieldDef, FieldType, ScalarType, TypeDef};
use crate::document::Document;
use crate::error::Error;
use crate::id::Id;

/// Fill in defaults for declared fields that are missing or null.
pub fn apply_defaults(def: &TypeDef, doc: &mut Document) {
    for field in &def.fields {
        let Some(default) = &field.default else {
            continue;
        };
        let missing = matches!(doc.get(&field.name), None | Some(Value::Null));
        if missing {
            doc.insert(field.name.clone(), default.to_value());
        }
    }
}

/// Validate a document against its type definition.
pub fn validate(def: &TypeDef, doc: &Document) -> Result<(), Error> {
    for field in &def.fields {
        match doc.get(&field.name) {
            None | Some(Value::Null) => {
                if field.required {
                    return Err(Error::validation(&def.name, &field.name, "field is required"));
                }
            }
            Some(value) => validate_field(def, field, value)?,
        }
    }
    Ok(())
}

fn validate_field(def: &TypeDef, field: &FieldDef, value: &Value) -> Result<(), Error> {
    let fail = |reason: String| Error::validation(&def.name, &field.name, reason);

    match &field.field_type {
        FieldType::Scalar(scalar) | FieldType::OptionalScalar(scalar) => {
            if !scalar_matches(*scalar, value) {
                return Err(fail(format!("expected {}", scalar.name())));
            }
        }
        FieldType::ArrayScalar(scalar) => {
            let items = value.as_array().ok_or_else(|| fail("expected array".into()))?;
            if let Some(pos) = items.iter().position(|v| !scalar_matches(*scalar, v)) {
                return Err(fail(format!("element {} is not {}", pos, scalar.name())));
            }
        }
        FieldType::Reference { target } => {
            if Id::from_value_bare(value).is_none() {
                return Err(fail(format!("expected identity of {}", target)));
            }
        }
        FieldType::ReferenceArray { target } => {
            let items = value.as_array().ok_or_else(|| fail("expected array".into()))?;
            // Null holes are tolerated in foreign key collections.
            let bad = items
                .iter()
                .position(|v| !v.is_null() && Id::from_value_bare(v).is_none());
            if let Some(pos) = bad {
                return Err(fail(format!("element {} is not an identity of {}", pos, target)));
            }
        }
    }
    Ok(())
}

fn scalar_matches(scalar: ScalarType, value: &Value) -> bool {
    match scalar {
        ScalarType::Bool => value.is_boolean(),
        ScalarType::Int32 => value
            .as_i64()
            .is_some_and(|i| i32::try_from(i).is_ok()),
        ScalarType::Int64 => value.is_i64() || value.is_u64(),
        ScalarType::Float64 => value.is_number(),
        ScalarType::String => value.is_string(),
        ScalarType::Timestamp => value.is_u64(),
        ScalarType::Id => Id::from_value_bare(value).is_some(),
        ScalarType::Json => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DefaultValue;
    use serde_json::json;

    fn root() -> TypeDef {
        TypeDef::new("Root")
            .with_field(
                FieldDef::optional("name", FieldType::scalar(ScalarType::String))
                    .with_default(DefaultValue::String(String::new())),
            )
            .with_field(FieldDef::optional_scalar("age", ScalarType::Int32))
            .with_field(FieldDef::new("leaf", FieldType::reference("Leaf")))
            .with_field(FieldDef::optional("leaves", FieldType::reference_array("Leaf")))
    }

    fn doc(value: Value) -> Document {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_valid_document() {
        let leaf = Id::generate().to_value();
        let d = doc(json!({ "name": "y", "age": 3, "leaf": leaf, "leaves": [leaf, null] }));
        assert!(validate(&root(), &d).is_ok());
    }

    #[test]
    fn test_missing_required() {
        let err = validate(&root(), &doc(json!({ "name": "y" }))).unwrap_err();
        assert!(matches!(err, Error::Validation { field, .. } if field == "leaf"));
    }

    #[test]
    fn test_wrong_types() {
        let leaf = Id::generate().to_value();

        let bad_scalar = doc(json!({ "name": 5, "leaf": leaf }));
        assert!(validate(&root(), &bad_scalar).is_err());

        let bad_range = doc(json!({ "age": 5_000_000_000i64, "leaf": leaf }));
        assert!(validate(&root(), &bad_range).is_err());

        let embedded = doc(json!({ "leaf": { "name": "x" } }));
        assert!(validate(&root(), &embedded).is_err());

        let bad_array = doc(json!({ "leaf": leaf, "leaves": ["nope"] }));
        assert!(validate(&root(), &bad_array).is_err());
    }

    #[test]
    fn test_apply_defaults() {
        let mut d = doc(json!({ "name": null }));
        apply_defaults(&root(), &mut d);
        assert_eq!(d["name"], "");
        assert!(!d.contains_key("age"));
    }
}
