//! Type catalog for docgraph.
//!
//! The catalog stores the definitions of registered document types: their
//! fields, foreign keys and relations.

mod catalog;
mod field;
mod relation;
mod typedef;
mod types;

pub use catalog::Catalog;
pub use field::{DefaultValue, FieldDef, FieldOptions};
pub use relation::{Cardinality, RelationDef};
pub use typedef::TypeDef;
pub use types::{FieldType, ScalarType};
