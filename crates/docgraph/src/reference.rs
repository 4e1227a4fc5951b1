//! Reference descriptors and the per-schema reference registry.

use std::fmt;

use docgraph_core::{Cardinality, FieldOptions};

use crate::builder::SchemaBuilder;

/// Placeholder rendered in place of the parent type name before compilation.
pub const PARENT_PLACEHOLDER: &str = "{{parent}}";

/// What a reference points at.
pub enum Target {
    /// A type registered (or to be registered) under this name.
    Named(String),
    /// A type defined inline; compiled under the relation name.
    Inline(Box<SchemaBuilder>),
}

impl Target {
    /// Whether this target is defined inline.
    pub fn is_inline(&self) -> bool {
        matches!(self, Target::Inline(_))
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Target::Inline(_) => f.write_str("Inline(..)"),
        }
    }
}

impl From<&str> for Target {
    fn from(name: &str) -> Self {
        Target::Named(name.to_string())
    }
}

impl From<String> for Target {
    fn from(name: String) -> Self {
        Target::Named(name)
    }
}

impl From<SchemaBuilder> for Target {
    fn from(builder: SchemaBuilder) -> Self {
        Target::Inline(Box::new(builder))
    }
}

/// A relation name before the parent type name is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationName {
    /// Independent of the parent: `has("leaf").one(..)` gives `Leaf`.
    Fixed(String),
    /// Prefixed with the parent name: `has("leaves").many(..)` on `Root`
    /// gives `RootLeave`.
    ParentPrefixed(String),
}

impl RelationName {
    /// Relation name for a single-valued reference.
    pub fn for_one(field: &str) -> Self {
        RelationName::Fixed(capitalize(field))
    }

    /// Relation name for a collection reference.
    pub fn for_many(field: &str) -> Self {
        RelationName::ParentPrefixed(capitalize(singularize(field)))
    }

    /// Substitute the parent type name.
    pub fn resolve(&self, parent: &str) -> String {
        match self {
            RelationName::Fixed(name) => name.clone(),
            RelationName::ParentPrefixed(fragment) => format!("{}{}", parent, fragment),
        }
    }
}

impl fmt::Display for RelationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationName::Fixed(name) => f.write_str(name),
            RelationName::ParentPrefixed(fragment) => {
                write!(f, "{}{}", PARENT_PLACEHOLDER, fragment)
            }
        }
    }
}

/// Upper-case the first character.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Drop one trailing character. Assumes a regular English plural.
pub fn singularize(s: &str) -> &str {
    match s.char_indices().next_back() {
        Some((last, _)) => &s[..last],
        None => s,
    }
}

/// A declared relationship from a field to another type.
#[derive(Debug)]
pub struct ReferenceDescriptor {
    /// Field on the declaring type.
    pub field: String,
    /// One or many.
    pub relation: Cardinality,
    /// Referenced type.
    pub target: Target,
    /// Derived relation name, resolved at compile time.
    pub relation_name: RelationName,
    /// Options merged into the foreign key field.
    pub options: FieldOptions,
}

/// Ordered reference descriptors of one schema under construction.
///
/// Duplicate fields are not rejected; descriptors simply coexist.
#[derive(Debug, Default)]
pub struct ReferenceRegistry {
    descriptors: Vec<ReferenceDescriptor>,
}

impl ReferenceRegistry {
    /// Append a descriptor.
    pub fn push(&mut self, descriptor: ReferenceDescriptor) {
        self.descriptors.push(descriptor);
    }

    /// Descriptors in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, ReferenceDescriptor> {
        self.descriptors.iter()
    }

    /// Number of descriptors.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether no reference has been declared.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl IntoIterator for ReferenceRegistry {
    type Item = ReferenceDescriptor;
    type IntoIter = std::vec::IntoIter<ReferenceDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.descriptors.into_iter()
    }
}

/// A pending `has(field)` declaration; finish it with [`one`](Self::one) or
/// [`many`](Self::many).
#[must_use = "a reference is only declared once `.one()` or `.many()` is called"]
pub struct HasReference {
    builder: SchemaBuilder,
    field: String,
    options: FieldOptions,
}

impl HasReference {
    pub(crate) fn new(builder: SchemaBuilder, field: String, options: FieldOptions) -> Self {
        Self {
            builder,
            field,
            options,
        }
    }

    /// Declare a single-valued reference.
    pub fn one(self, target: impl Into<Target>) -> SchemaBuilder {
        let relation_name = RelationName::for_one(&self.field);
        self.finish(Cardinality::One, relation_name, target.into())
    }

    /// Declare a collection reference.
    pub fn many(self, target: impl Into<Target>) -> SchemaBuilder {
        let relation_name = RelationName::for_many(&self.field);
        self.finish(Cardinality::Many, relation_name, target.into())
    }

    fn finish(
        self,
        relation: Cardinality,
        relation_name: RelationName,
        target: Target,
    ) -> SchemaBuilder {
        let HasReference {
            mut builder,
            field,
            options,
        } = self;
        builder.references_mut().push(ReferenceDescriptor {
            field,
            relation,
            target,
            relation_name,
            options,
        });
        builder
    }
}
