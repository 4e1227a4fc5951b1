//! Catalog of registered document types.

use std::collections::HashMap;

use super::TypeDef;
use crate::error::Error;
use parking_lot::RwLock;
use sled::{Db, Tree};
use tracing::debug;

/// Tree name for type definitions.
const TYPES_TREE: &str = "catalog:types";

/// Persistent, name-keyed registry of document types.
///
/// Registering an existing name replaces the previous definition.
pub struct Catalog {
    /// Type definitions tree (name -> TypeDef bytes).
    types_tree: Tree,
    /// Cached definitions.
    cache: RwLock<HashMap<String, TypeDef>>,
}

impl Catalog {
    /// Open or create a catalog using the given sled database.
    pub fn open(db: &Db) -> Result<Self, Error> {
        let types_tree = db.open_tree(TYPES_TREE)?;

        let mut cache = HashMap::new();
        for result in types_tree.iter() {
            let (_, bytes) = result?;
            let def = TypeDef::from_bytes(&bytes)?;
            cache.insert(def.name.clone(), def);
        }

        Ok(Self {
            types_tree,
            cache: RwLock::new(cache),
        })
    }

    /// Register a type, returning the definition it replaced.
    pub fn register(&self, def: TypeDef) -> Result<Option<TypeDef>, Error> {
        let mut cache = self.cache.write();
        self.types_tree.insert(def.name.as_bytes(), def.to_bytes()?)?;
        let previous = cache.insert(def.name.clone(), def);
        if let Some(previous) = &previous {
            debug!(type_name = %previous.name, "Replaced type definition");
        }
        Ok(previous)
    }

    /// Get a type definition by name.
    pub fn get(&self, name: &str) -> Option<TypeDef> {
        self.cache.read().get(name).cloned()
    }

    /// Check whether a type is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.cache.read().contains_key(name)
    }

    /// List all registered type names, sorted.
    pub fn list_types(&self) -> Vec<String> {
        let mut names: Vec<String> = self.cache.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Flush pending writes to disk.
    pub fn flush(&self) -> Result<(), Error> {
        self.types_tree.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FieldDef, FieldType, RelationDef, ScalarType};

    fn leaf() -> TypeDef {
        TypeDef::new("Leaf")
            .with_field(FieldDef::new("name", FieldType::scalar(ScalarType::String)))
    }

    fn root() -> TypeDef {
        TypeDef::new("Root")
            .with_field(FieldDef::new("name", FieldType::scalar(ScalarType::String)))
            .with_field(FieldDef::optional("leaf", FieldType::reference("Leaf")))
            .with_relation(RelationDef::one("Leaf", "leaf", "Leaf"))
    }

    fn test_db() -> sled::Db {
        sled::Config::new().temporary(true).open().unwrap()
    }

    #[test]
    fn test_catalog_open_empty() {
        let db = test_db();
        let catalog = Catalog::open(&db).unwrap();

        assert!(catalog.list_types().is_empty());
        assert!(catalog.get("Leaf").is_none());
    }

    #[test]
    fn test_register_and_get() {
        let db = test_db();
        let catalog = Catalog::open(&db).unwrap();

        assert!(catalog.register(leaf()).unwrap().is_none());
        assert!(catalog.register(root()).unwrap().is_none());

        assert_eq!(catalog.get("Root").unwrap().relations.len(), 1);
        assert!(catalog.contains("Leaf"));
        assert_eq!(catalog.list_types(), vec!["Leaf".to_string(), "Root".to_string()]);
    }

    #[test]
    fn test_register_overwrites() {
        let db = test_db();
        let catalog = Catalog::open(&db).unwrap();

        catalog.register(leaf()).unwrap();
        let replacement = TypeDef::new("Leaf");
        let previous = catalog.register(replacement).unwrap().unwrap();

        assert_eq!(previous.fields.len(), 1);
        assert!(catalog.get("Leaf").unwrap().fields.is_empty());
        assert_eq!(catalog.list_types().len(), 1);
    }

    #[test]
    fn test_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let config = sled::Config::new().path(dir.path());

        {
            let db = config.clone().open().unwrap();
            let catalog = Catalog::open(&db).unwrap();
            catalog.register(leaf()).unwrap();
            catalog.register(root()).unwrap();
            catalog.flush().unwrap();
        }

        {
            let db = config.open().unwrap();
            let catalog = Catalog::open(&db).unwrap();

            assert_eq!(catalog.list_types().len(), 2);
            assert_eq!(catalog.get("Root").unwrap(), root());
        }
    }
}
