//! docgraph relationship compiler.
//!
//! Declare document types with a [`SchemaBuilder`], link them with
//! `has(field).one(target)` / `.many(target)` and compile them into a
//! [`Database`]. Instances of compiled models can then merge payloads with
//! embedded references ([`Instance::merge_in`]) and project themselves with
//! references expanded ([`Instance::expand_out`]).

pub mod builder;
pub mod capability;
pub mod compiler;
pub mod database;
pub mod error;
pub mod materialize;
pub mod model;
pub mod reference;
pub mod schema;
pub mod traversal;

pub use builder::{Preferences, SchemaBuilder, MANUAL_REFERENCE_SANITIZATION};
pub use capability::{Lightweight, Sanitize};
pub use database::Database;
pub use error::{Error, MaterializeFailure};
pub use model::{Instance, Model};
pub use reference::{HasReference, ReferenceDescriptor, ReferenceRegistry, RelationName, Target};
pub use schema::{Plugin, Schema};
pub use traversal::{Completion, Signal, Traversal};

pub use docgraph_core::{
    Cardinality, DefaultValue, Document, FieldDef, FieldOptions, FieldType, Id, RelationDef,
    ScalarType, StorageConfig, TypeDef, IDENTITY_FIELD,
};
