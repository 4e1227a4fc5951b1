//! docgraph core - versioned document storage, type catalog and validation.
//!
//! This crate is the persistence engine the relationship compiler in the
//! `docgraph` crate registers types with and reads documents from.

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod catalog;
pub mod document;
pub mod error;
pub mod id;
pub mod storage;
pub mod validate;

pub use catalog::{
    Cardinality, Catalog, DefaultValue, FieldDef, FieldOptions, FieldType, RelationDef,
    ScalarType, TypeDef,
};
pub use document::{Document, ReferenceShape, IDENTITY_FIELD};
pub use error::Error;
pub use id::Id;
pub use storage::{Record, StorageConfig, StorageEngine, VersionedKey};
