//! Relationship compiler.
//!
//! Turns a [`SchemaBuilder`] into a registered [`Model`]. Inline targets are
//! compiled first, under their resolved relation names, so each nested type
//! is fully registered before its parent references it.

use std::sync::Arc;

use docgraph_core::{Cardinality, FieldDef, FieldType, RelationDef, TypeDef};
use tracing::{debug, warn};

use crate::builder::SchemaBuilder;
use crate::error::Error;
use crate::model::Model;
use crate::reference::{ReferenceDescriptor, Target};

/// How a compiled model is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Registration {
    /// Replace any model with the same name.
    Overwrite,
    /// Fail if the name is taken.
    Once,
}

impl SchemaBuilder {
    /// Compile and register this schema under `name`.
    ///
    /// Registers one model for `name` plus one per inline reference target.
    /// A model already registered under any of those names is replaced.
    pub fn compile(self, name: impl Into<String>) -> Result<Arc<Model>, Error> {
        compile(self, name.into(), Registration::Overwrite)
    }

    /// Like [`compile`](Self::compile), but fails with
    /// [`Error::AlreadyRegistered`] if `name` or a nested name is taken.
    ///
    /// Every name the schema would register is checked before anything is
    /// registered, so a rejected call leaves the database unchanged.
    pub fn compile_once(self, name: impl Into<String>) -> Result<Arc<Model>, Error> {
        let name = name.into();

        let mut names = vec![name.clone()];
        claimed_names(&self, &name, &mut names);
        for (i, claimed) in names.iter().enumerate() {
            if names[..i].contains(claimed) || self.db.model(claimed).is_some() {
                return Err(Error::AlreadyRegistered(claimed.clone()));
            }
        }

        compile(self, name, Registration::Once)
    }
}

/// Collect the names of all inline targets below `builder`, depth first.
fn claimed_names(builder: &SchemaBuilder, parent: &str, names: &mut Vec<String>) {
    for descriptor in builder.references.iter() {
        if let Target::Inline(nested) = &descriptor.target {
            let name = descriptor.relation_name.resolve(parent);
            claimed_names(nested, &name, names);
            names.push(name);
        }
    }
}

fn compile(builder: SchemaBuilder, name: String, mode: Registration) -> Result<Arc<Model>, Error> {
    let SchemaBuilder {
        db,
        mut schema,
        preferences,
        references,
        lightweight,
        sanitize,
    } = builder;

    let mut relations = Vec::with_capacity(references.len());

    for descriptor in references {
        let (field_def, relation_def) = resolve(descriptor, &name, mode)?;
        schema.def.put_field(field_def);
        relations.push(relation_def);
    }

    let def = TypeDef {
        name: name.clone(),
        fields: schema.def.fields,
        relations,
    };
    debug!(
        type_name = %name,
        fields = def.fields.len(),
        relations = def.relations.len(),
        "Compiled schema"
    );

    let model = Model {
        def,
        pre_save: schema.pre_save,
        methods: schema.methods,
        preferences,
        lightweight,
        sanitize,
        db: db.downgrade(),
    };
    db.register(model, mode)
}

/// Resolve one descriptor into its foreign key field and relation.
fn resolve(
    descriptor: ReferenceDescriptor,
    parent: &str,
    mode: Registration,
) -> Result<(FieldDef, RelationDef), Error> {
    let ReferenceDescriptor {
        field,
        relation,
        target,
        relation_name,
        options,
    } = descriptor;

    let relation_name = relation_name.resolve(parent);
    let target = match target {
        Target::Named(target) => target,
        Target::Inline(nested) => {
            if relation_name == parent {
                warn!(
                    type_name = %parent,
                    field = %field,
                    "Inline target shares its parent's name and will be replaced"
                );
            }
            compile(*nested, relation_name.clone(), mode)?;
            relation_name.clone()
        }
    };

    let field_type = match relation {
        Cardinality::One => FieldType::reference(&target),
        Cardinality::Many => FieldType::reference_array(&target),
    };
    let field_def = FieldDef::optional(&field, field_type).with_options(&options);

    let relation_def = RelationDef {
        name: relation_name,
        field,
        target,
        cardinality: relation,
    };
    Ok((field_def, relation_def))
}
