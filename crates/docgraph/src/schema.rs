//! The mutable schema a builder configures.
//!
//! This is what `configure_with` and plugins receive: the field map plus
//! save hooks and named methods.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use docgraph_core::{Document, FieldDef, TypeDef};
use serde_json::Value;

use crate::model::Instance;

/// Hook run on the document before every save.
pub type SaveHook = Arc<dyn Fn(&mut Document) + Send + Sync>;

/// A named behavior callable on instances.
pub type Method = Arc<dyn Fn(&Instance) -> Value + Send + Sync>;

/// Field map, save hooks and methods of a type under construction.
#[derive(Clone)]
pub struct Schema {
    pub(crate) def: TypeDef,
    pub(crate) pre_save: Vec<SaveHook>,
    pub(crate) methods: HashMap<String, Method>,
}

impl Schema {
    /// Create a schema with the given fields.
    pub fn new(fields: impl IntoIterator<Item = FieldDef>) -> Self {
        Self {
            def: TypeDef::new("").with_fields(fields),
            pre_save: Vec::new(),
            methods: HashMap::new(),
        }
    }

    /// Merge fields into the field map, replacing same-named fields.
    pub fn add(&mut self, fields: impl IntoIterator<Item = FieldDef>) -> &mut Self {
        for field in fields {
            self.def.put_field(field);
        }
        self
    }

    /// Get a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.def.get_field(name)
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldDef] {
        &self.def.fields
    }

    /// Register a hook that runs on the document before every save.
    pub fn pre_save(&mut self, hook: impl Fn(&mut Document) + Send + Sync + 'static) -> &mut Self {
        self.pre_save.push(Arc::new(hook));
        self
    }

    /// Attach a named method.
    pub fn method(
        &mut self,
        name: impl Into<String>,
        method: impl Fn(&Instance) -> Value + Send + Sync + 'static,
    ) -> &mut Self {
        self.methods.insert(name.into(), Arc::new(method));
        self
    }

    /// Apply a plugin.
    pub fn plugin(&mut self, plugin: impl Plugin) -> &mut Self {
        plugin.apply(self);
        self
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new(std::iter::empty())
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<_> = self.methods.keys().collect();
        methods.sort();
        f.debug_struct("Schema")
            .field("fields", &self.def.fields)
            .field("pre_save", &self.pre_save.len())
            .field("methods", &methods)
            .finish()
    }
}

/// A reusable unit of schema configuration.
pub trait Plugin {
    /// Apply this plugin to a schema.
    fn apply(&self, schema: &mut Schema);
}

impl<F> Plugin for F
where
    F: Fn(&mut Schema),
{
    fn apply(&self, schema: &mut Schema) {
        self(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docgraph_core::{FieldType, ScalarType};

    fn name() -> FieldDef {
        FieldDef::optional("name", FieldType::scalar(ScalarType::String))
    }

    #[test]
    fn test_add_replaces() {
        let mut schema = Schema::new([name()]);
        schema.add([
            FieldDef::new("name", FieldType::scalar(ScalarType::String)),
            FieldDef::optional_scalar("age", ScalarType::Int32),
        ]);

        assert_eq!(schema.fields().len(), 2);
        assert!(schema.field("name").unwrap().required);
    }

    struct Timestamps;

    impl Plugin for Timestamps {
        fn apply(&self, schema: &mut Schema) {
            schema.add([FieldDef::optional_scalar("updated_at", ScalarType::Timestamp)]);
            schema.pre_save(|doc| {
                doc.insert(
                    "updated_at".into(),
                    docgraph_core::storage::key::current_timestamp().into(),
                );
            });
        }
    }

    #[test]
    fn test_plugins() {
        let mut schema = Schema::new([name()]);
        schema
            .plugin(Timestamps)
            .plugin(|s: &mut Schema| {
                s.method("kind", |_| Value::from("leaf"));
            });

        assert!(schema.field("updated_at").is_some());
        assert_eq!(schema.pre_save.len(), 1);
        assert!(schema.methods.contains_key("kind"));
    }
}
