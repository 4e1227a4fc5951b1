//! Schema builder: accumulates fields, behaviors and references until
//! [`compile`](SchemaBuilder::compile).

use std::fmt;
use std::sync::Arc;

use docgraph_core::{FieldDef, FieldOptions};
use serde_json::{Map, Value};

use crate::capability::{Lightweight, Sanitize};
use crate::database::Database;
use crate::model::Instance;
use crate::reference::{HasReference, ReferenceRegistry};
use crate::schema::{Plugin, Schema};

/// Preference that disables reference expansion in `expand_out`.
pub const MANUAL_REFERENCE_SANITIZATION: &str = "manualReferenceSanitization";

/// Key/value preferences of a type.
pub type Preferences = Map<String, Value>;

/// Declarative description of a document type.
///
/// ```ignore
/// let root = SchemaBuilder::new(&db, [name_field()])
///     .has_field("leaf").one("Leaf")
///     .has_field("branches").many(SchemaBuilder::new(&db, [name_field()]))
///     .compile("Root")?;
/// ```
pub struct SchemaBuilder {
    pub(crate) db: Database,
    pub(crate) schema: Schema,
    pub(crate) preferences: Preferences,
    pub(crate) references: ReferenceRegistry,
    pub(crate) lightweight: Option<Arc<dyn Lightweight>>,
    pub(crate) sanitize: Option<Arc<dyn Sanitize>>,
}

impl SchemaBuilder {
    /// Start a schema with primitive fields.
    pub fn new(db: &Database, fields: impl IntoIterator<Item = FieldDef>) -> Self {
        Self {
            db: db.clone(),
            schema: Schema::new(fields),
            preferences: Preferences::new(),
            references: ReferenceRegistry::default(),
            lightweight: None,
            sanitize: None,
        }
    }

    /// Merge fields into the field map.
    pub fn configure(mut self, fields: impl IntoIterator<Item = FieldDef>) -> Self {
        self.schema.add(fields);
        self
    }

    /// Configure the underlying schema directly.
    pub fn configure_with(mut self, configure: impl FnOnce(&mut Schema)) -> Self {
        configure(&mut self.schema);
        self
    }

    /// Apply a plugin to the underlying schema.
    pub fn plugin(mut self, plugin: impl Plugin) -> Self {
        self.schema.plugin(plugin);
        self
    }

    /// Attach a named method, callable with [`Instance::call`].
    pub fn method(
        mut self,
        name: impl Into<String>,
        method: impl Fn(&Instance) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.schema.method(name, method);
        self
    }

    /// Provide the lightweight projection used when this type is expanded
    /// as a reference.
    pub fn lightweight(mut self, lightweight: impl Lightweight + 'static) -> Self {
        self.lightweight = Some(Arc::new(lightweight));
        self
    }

    /// Provide the base projection of `expand_out`.
    pub fn sanitize(mut self, sanitize: impl Sanitize + 'static) -> Self {
        self.sanitize = Some(Arc::new(sanitize));
        self
    }

    /// Set a preference.
    pub fn set_preference(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.preferences.insert(key.into(), value.into());
        self
    }

    /// Merge several preferences at once.
    pub fn set_preferences(mut self, preferences: Preferences) -> Self {
        self.preferences.extend(preferences);
        self
    }

    /// Read a preference.
    pub fn get_preference(&self, key: &str) -> Option<&Value> {
        self.preferences.get(key)
    }

    /// Return the base projection from `expand_out` without expanding
    /// references.
    pub fn sanitize_references_manually(self) -> Self {
        self.set_preference(MANUAL_REFERENCE_SANITIZATION, true)
    }

    /// Declare a reference with options.
    pub fn has(self, field: impl Into<String>, options: FieldOptions) -> HasReference {
        HasReference::new(self, field.into(), options)
    }

    /// Declare a reference with default options.
    pub fn has_field(self, field: impl Into<String>) -> HasReference {
        self.has(field, FieldOptions::default())
    }

    /// Declare a required reference.
    pub fn requires(self, field: impl Into<String>) -> HasReference {
        self.has(field, FieldOptions::required())
    }

    /// Declared references.
    pub fn references(&self) -> &ReferenceRegistry {
        &self.references
    }

    /// The schema being configured.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub(crate) fn references_mut(&mut self) -> &mut ReferenceRegistry {
        &mut self.references
    }
}

impl fmt::Debug for SchemaBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaBuilder")
            .field("schema", &self.schema)
            .field("preferences", &self.preferences)
            .field("references", &self.references)
            .field("lightweight", &self.lightweight.is_some())
            .field("sanitize", &self.sanitize.is_some())
            .finish()
    }
}
