//! Storage layer for docgraph.
//!
//! A sled-based, versioned document store with bounded history.

mod config;
mod engine;
mod record;

pub mod key;

pub use config::{RetentionPolicy, StorageConfig};
pub use engine::StorageEngine;
pub use key::VersionedKey;
pub use record::Record;
