//! Compiled models and their instances.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use docgraph_core::document::document_id;
use docgraph_core::validate::{apply_defaults, validate};
use docgraph_core::{Document, FieldType, Id, RelationDef, ReferenceShape, TypeDef, IDENTITY_FIELD};
use serde_json::Value;
use tracing::{debug, trace};

use crate::builder::{Preferences, MANUAL_REFERENCE_SANITIZATION};
use crate::capability::{Lightweight, Sanitize};
use crate::database::{Database, Shared};
use crate::error::Error;
use crate::schema::{Method, SaveHook};

/// A registered document type.
///
/// Produced by [`SchemaBuilder::compile`](crate::SchemaBuilder::compile) and
/// immutable afterwards.
pub struct Model {
    pub(crate) def: TypeDef,
    pub(crate) pre_save: Vec<SaveHook>,
    pub(crate) methods: HashMap<String, Method>,
    pub(crate) preferences: Preferences,
    pub(crate) lightweight: Option<Arc<dyn Lightweight>>,
    pub(crate) sanitize: Option<Arc<dyn Sanitize>>,
    pub(crate) db: Weak<Shared>,
}

impl Model {
    /// Registered name.
    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// The type definition stored in the catalog.
    pub fn def(&self) -> &TypeDef {
        &self.def
    }

    /// Relations in declaration order.
    pub fn relations(&self) -> &[RelationDef] {
        &self.def.relations
    }

    /// Read a preference.
    pub fn preference(&self, key: &str) -> Option<&Value> {
        self.preferences.get(key)
    }

    /// Whether `expand_out` should skip reference expansion.
    pub fn manual_reference_sanitization(&self) -> bool {
        self.preference(MANUAL_REFERENCE_SANITIZATION)
            .is_some_and(truthy)
    }

    /// Names of the attached methods, sorted.
    pub fn methods(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Create an unsaved instance from a document.
    ///
    /// A valid identity in `doc` is kept; otherwise a fresh one is assigned.
    pub fn create(self: &Arc<Self>, doc: Document) -> Result<Instance, Error> {
        Ok(Instance::new(Arc::clone(self), self.database()?, doc))
    }

    /// Load a document by identity.
    pub async fn find_one(self: &Arc<Self>, id: Id) -> Result<Option<Instance>, Error> {
        let db = self.database()?;
        let found = db.storage().get_document(self.name(), id)?;
        trace!(type_name = %self.name(), id = %id, found = found.is_some(), "Lookup");
        Ok(found.map(|doc| Instance::stored(Arc::clone(self), db, id, doc)))
    }

    /// Load every live document of this type.
    pub async fn find_all(self: &Arc<Self>) -> Result<Vec<Instance>, Error> {
        let db = self.database()?;
        let mut instances = Vec::new();
        for entry in db.storage().scan_type(self.name()) {
            let (id, doc) = entry?;
            instances.push(Instance::stored(Arc::clone(self), db.clone(), id, doc));
        }
        Ok(instances)
    }

    fn database(&self) -> Result<Database, Error> {
        self.db
            .upgrade()
            .map(Database::from_shared)
            .ok_or(Error::DatabaseClosed)
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("def", &self.def)
            .field("pre_save", &self.pre_save.len())
            .field("methods", &self.methods())
            .field("preferences", &self.preferences)
            .field("lightweight", &self.lightweight.is_some())
            .field("sanitize", &self.sanitize.is_some())
            .finish()
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// A document of a compiled model.
pub struct Instance {
    pub(crate) model: Arc<Model>,
    pub(crate) db: Database,
    id: Id,
    doc: Document,
    persisted: bool,
}

impl Instance {
    pub(crate) fn new(model: Arc<Model>, db: Database, doc: Document) -> Self {
        let id = document_id(&doc).unwrap_or_else(Id::generate);
        let mut instance = Self {
            model,
            db,
            id,
            doc: Document::new(),
            persisted: false,
        };
        instance.doc.insert(IDENTITY_FIELD.to_string(), id.to_value());
        for (field, value) in doc {
            instance.set(field, value);
        }
        apply_defaults(&instance.model.def, &mut instance.doc);
        instance
    }

    pub(crate) fn stored(model: Arc<Model>, db: Database, id: Id, doc: Document) -> Self {
        Self {
            model,
            db,
            id,
            doc,
            persisted: true,
        }
    }

    /// Identity of this document.
    pub fn id(&self) -> Id {
        self.id
    }

    /// The model this instance belongs to.
    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    /// Whether this instance has been saved or loaded from storage.
    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    /// Read a field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.doc.get(field)
    }

    /// Assign a field.
    ///
    /// Foreign key fields store identities: an object carrying an identity
    /// (such as another instance's document) is reduced to that identity.
    /// The identity field cannot be reassigned.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        let field = field.into();
        if field == IDENTITY_FIELD {
            trace!(type_name = %self.model.name(), "Ignoring identity assignment");
            return;
        }
        let value = match self.model.def.get_field(&field).map(|f| &f.field_type) {
            Some(FieldType::Reference { .. }) => foreign_key(value.into()),
            Some(FieldType::ReferenceArray { .. }) => match value.into() {
                Value::Array(items) => Value::Array(items.into_iter().map(foreign_key).collect()),
                other => other,
            },
            _ => value.into(),
        };
        self.doc.insert(field, value);
    }

    /// The stored fields, identity included.
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Default projection: a copy of the stored fields.
    pub fn to_document(&self) -> Document {
        self.doc.clone()
    }

    /// Run save hooks, validate and persist.
    ///
    /// Hook changes are kept only when the save succeeds.
    pub async fn save(&mut self) -> Result<(), Error> {
        let mut doc = self.doc.clone();
        for hook in &self.model.pre_save {
            hook(&mut doc);
        }
        doc.insert(IDENTITY_FIELD.to_string(), self.id.to_value());

        apply_defaults(&self.model.def, &mut doc);
        validate(&self.model.def, &doc)?;

        let version = self.db.storage().put_document(self.model.name(), self.id, &doc)?;
        debug!(type_name = %self.model.name(), id = %self.id, version, "Saved document");

        self.doc = doc;
        self.persisted = true;
        Ok(())
    }

    /// Delete this document.
    pub async fn remove(&mut self) -> Result<(), Error> {
        let removed = self.db.storage().delete_document(self.model.name(), self.id)?;
        debug!(type_name = %self.model.name(), id = %self.id, removed, "Removed document");
        self.persisted = false;
        Ok(())
    }

    /// Call a method attached to the model.
    pub fn call(&self, method: &str) -> Result<Value, Error> {
        let f = self
            .model
            .methods
            .get(method)
            .ok_or_else(|| Error::UnknownMethod {
                type_name: self.model.name().to_string(),
                method: method.to_string(),
            })?;
        Ok(f(self))
    }

    /// Lightweight projection if the model provides one, default otherwise.
    pub async fn lightweight(&self) -> Document {
        match &self.model.lightweight {
            Some(lightweight) => lightweight.lightweight(self).await,
            None => self.to_document(),
        }
    }

    /// Sanitized projection if the model provides one, default otherwise.
    pub async fn sanitized(&self) -> Document {
        match &self.model.sanitize {
            Some(sanitize) => sanitize.sanitize(self).await,
            None => self.to_document(),
        }
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("model", &self.model.name())
            .field("id", &self.id)
            .field("doc", &self.doc)
            .field("persisted", &self.persisted)
            .finish()
    }
}

impl From<&Instance> for Value {
    fn from(instance: &Instance) -> Self {
        Value::Object(instance.to_document())
    }
}

/// Reduce an identified object to its bare identity.
fn foreign_key(value: Value) -> Value {
    match ReferenceShape::of(Some(&value)) {
        ReferenceShape::Identified(id) => id.to_value(),
        _ => value,
    }
}
