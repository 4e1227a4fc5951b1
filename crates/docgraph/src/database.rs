//! Database handle: storage, catalog and the registry of compiled models.

use std::sync::{Arc, Weak};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use docgraph_core::{Catalog, Document, FieldDef, Id, StorageConfig, StorageEngine};
use tracing::{debug, info};

use crate::builder::SchemaBuilder;
use crate::compiler::Registration;
use crate::error::Error;
use crate::model::{Instance, Model};

pub(crate) struct Shared {
    storage: StorageEngine,
    catalog: Catalog,
    models: DashMap<String, Arc<Model>>,
}

/// Cheaply cloneable handle to an open database.
///
/// Builders compile into the model registry of the handle they were
/// created with.
#[derive(Clone)]
pub struct Database {
    shared: Arc<Shared>,
}

impl Database {
    /// Open a database with the given storage configuration.
    pub fn open(config: StorageConfig) -> Result<Self, Error> {
        let storage = StorageEngine::open(config)?;
        let catalog = Catalog::open(storage.db())?;

        info!(
            catalog_types = catalog.list_types().len(),
            recovered = storage.was_recovered(),
            "Opened database"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                storage,
                catalog,
                models: DashMap::new(),
            }),
        })
    }

    /// Open a temporary database, removed on drop.
    pub fn temporary() -> Result<Self, Error> {
        Self::open(StorageConfig::temporary())
    }

    /// Start a schema bound to this database.
    pub fn schema(&self, fields: impl IntoIterator<Item = FieldDef>) -> SchemaBuilder {
        SchemaBuilder::new(self, fields)
    }

    /// Get a compiled model by name.
    pub fn model(&self, name: &str) -> Option<Arc<Model>> {
        self.shared.models.get(name).map(|m| Arc::clone(m.value()))
    }

    /// Names of all compiled models, sorted.
    pub fn models(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .shared
            .models
            .iter()
            .map(|m| m.key().clone())
            .collect();
        names.sort();
        names
    }

    /// Create an unsaved instance of a model.
    pub fn create(&self, type_name: &str, doc: Document) -> Result<Instance, Error> {
        let model = self
            .model(type_name)
            .ok_or_else(|| Error::UnknownModel(type_name.to_string()))?;
        Ok(Instance::new(model, self.clone(), doc))
    }

    /// Look up a document of a model by identity.
    pub async fn find_one(&self, type_name: &str, id: Id) -> Result<Option<Instance>, Error> {
        let model = self
            .model(type_name)
            .ok_or_else(|| Error::UnknownModel(type_name.to_string()))?;
        model.find_one(id).await
    }

    /// The type catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.shared.catalog
    }

    /// The document store.
    pub fn storage(&self) -> &StorageEngine {
        &self.shared.storage
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), Error> {
        self.shared.catalog.flush()?;
        self.shared.storage.flush()?;
        Ok(())
    }

    /// Register a compiled model.
    pub(crate) fn register(&self, model: Model, mode: Registration) -> Result<Arc<Model>, Error> {
        let name = model.def.name.clone();
        let model = Arc::new(model);

        match mode {
            Registration::Overwrite => {
                self.shared.catalog.register(model.def.clone())?;
                if self
                    .shared
                    .models
                    .insert(name.clone(), Arc::clone(&model))
                    .is_some()
                {
                    debug!(type_name = %name, "Replaced compiled model");
                }
            }
            Registration::Once => match self.shared.models.entry(name.clone()) {
                Entry::Occupied(_) => return Err(Error::AlreadyRegistered(name)),
                Entry::Vacant(slot) => {
                    self.shared.catalog.register(model.def.clone())?;
                    slot.insert(Arc::clone(&model));
                }
            },
        }

        debug!(type_name = %name, "Registered model");
        Ok(model)
    }

    pub(crate) fn downgrade(&self) -> Weak<Shared> {
        Arc::downgrade(&self.shared)
    }

    pub(crate) fn from_shared(shared: Arc<Shared>) -> Self {
        Self { shared }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docgraph_core::{FieldType, ScalarType};
    use serde_json::json;

    fn name() -> FieldDef {
        FieldDef::optional("name", FieldType::scalar(ScalarType::String))
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let db = Database::temporary().unwrap();
        db.schema([name()]).compile("Leaf").unwrap();

        let mut leaf = db
            .create("Leaf", json!({ "name": "x" }).as_object().unwrap().clone())
            .unwrap();
        leaf.save().await.unwrap();

        let found = db.find_one("Leaf", leaf.id()).await.unwrap().unwrap();
        assert_eq!(found.get("name"), Some(&json!("x")));
        assert!(db.find_one("Leaf", Id::generate()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_model() {
        let db = Database::temporary().unwrap();

        assert!(matches!(
            db.create("Nope", Document::new()),
            Err(Error::UnknownModel(name)) if name == "Nope"
        ));
        assert!(db.find_one("Nope", Id::generate()).await.is_err());
    }

    #[test]
    fn test_reopen_keeps_catalog() {
        let dir = tempfile::tempdir().unwrap();

        {
            let db = Database::open(StorageConfig::new(dir.path())).unwrap();
            db.schema([name()])
                .has_field("leaf")
                .one("Leaf")
                .compile("Root")
                .unwrap();
            db.flush().unwrap();
        }

        let db = Database::open(StorageConfig::new(dir.path())).unwrap();
        assert!(db.models().is_empty());
        let def = db.catalog().get("Root").unwrap();
        assert_eq!(def.relations[0].target, "Leaf");
    }
}
