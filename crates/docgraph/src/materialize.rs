//! Reference materialization.
//!
//! [`Instance::merge_in`] accepts a payload whose reference fields may hold
//! embedded documents and reduces them to foreign keys, persisting embedded
//! documents that have no identity yet. [`Instance::expand_out`] goes the
//! other way and replaces foreign keys with projections of the referenced
//! documents.
//!
//! Neither returns an error. Each failure is reported as a
//! [`MaterializeFailure`] and the value it concerns is left as it was.

use std::collections::HashMap;
use std::sync::Arc;

use docgraph_core::{Cardinality, Document, Id, RelationDef, ReferenceShape, IDENTITY_FIELD};
use serde_json::Value;
use tracing::debug;

use crate::error::MaterializeFailure;
use crate::model::{Instance, Model};
use crate::traversal::Traversal;

impl Instance {
    /// Merge a payload into this instance and save it.
    ///
    /// References are processed one at a time in declaration order, array
    /// elements in array order:
    ///
    /// - an object without an identity becomes a new document of the target
    ///   type, is saved, and is replaced by its identity;
    /// - an object with an identity is replaced by that identity;
    /// - anything else is kept as it is.
    ///
    /// The payload identity is ignored. Fields are then assigned and the
    /// instance is saved.
    pub async fn merge_in(&mut self, mut payload: Document) {
        payload.remove(IDENTITY_FIELD);

        let model = Arc::clone(&self.model);
        {
            let mut values: HashMap<&str, &mut Value> = payload
                .iter_mut()
                .map(|(field, value)| (field.as_str(), value))
                .collect();
            let references: Vec<(&RelationDef, &mut Value)> = model
                .relations()
                .iter()
                .filter_map(|relation| {
                    values
                        .remove(relation.field.as_str())
                        .map(|value| (relation, value))
                })
                .collect();

            let this = &*self;
            Traversal::new(references)
                .run(
                    |_, (relation, value)| this.merge_reference(relation, value),
                    |_, failure: MaterializeFailure| failure.report(),
                )
                .await;
        }

        for (field, value) in payload {
            self.set(field, value);
        }

        if let Err(source) = self.save().await {
            MaterializeFailure::Persistence {
                type_name: model.name().to_string(),
                field: None,
                source,
            }
            .report();
        }
    }

    async fn merge_reference(
        &self,
        relation: &RelationDef,
        value: &mut Value,
    ) -> Result<(), MaterializeFailure> {
        match (&relation.cardinality, value) {
            (Cardinality::Many, Value::Array(items)) => {
                let completion = Traversal::new(items.iter_mut())
                    .run(
                        |index, item| self.merge_element(relation, Some(index), item),
                        |_, failure: MaterializeFailure| failure.report(),
                    )
                    .await;
                debug!(
                    field = %relation.field,
                    visited = completion.visited,
                    failed = completion.failed,
                    "Merged reference collection"
                );
                Ok(())
            }
            (Cardinality::Many, _) => Ok(()),
            (Cardinality::One, value) => self.merge_element(relation, None, value).await,
        }
    }

    /// Reduce one reference value to a foreign key in place.
    async fn merge_element(
        &self,
        relation: &RelationDef,
        index: Option<usize>,
        value: &mut Value,
    ) -> Result<(), MaterializeFailure> {
        match ReferenceShape::of(Some(&*value)) {
            ReferenceShape::Null => match index {
                Some(index) => Err(MaterializeFailure::NullElement {
                    field: relation.field.clone(),
                    index,
                }),
                None => Ok(()),
            },
            ReferenceShape::Identified(id) => {
                *value = id.to_value();
                Ok(())
            }
            ReferenceShape::Embedded => {
                let Value::Object(doc) = value else {
                    return Ok(());
                };
                let target = self.target_model(relation, None)?;
                let mut child = target
                    .create(doc.clone())
                    .map_err(|source| persistence(relation, source))?;

                *value = child.id().to_value();
                child
                    .save()
                    .await
                    .map_err(|source| persistence(relation, source))
            }
            ReferenceShape::Bare(_) | ReferenceShape::Other => Ok(()),
        }
    }

    /// Project this instance with its references expanded.
    ///
    /// Starts from the sanitized projection (or the default one). Each
    /// foreign key is then replaced by the lightweight projection of the
    /// document it points at, unless the model asks for manual reference
    /// sanitization.
    pub async fn expand_out(&self) -> Document {
        let mut response = self.sanitized().await;

        let model = Arc::clone(&self.model);
        if model.relations().is_empty() || model.manual_reference_sanitization() {
            return response;
        }

        let mut references: Vec<(&RelationDef, Option<Value>)> = model
            .relations()
            .iter()
            .map(|relation| (relation, self.get(&relation.field).cloned()))
            .collect();

        Traversal::new(references.iter_mut())
            .run(
                |_, (relation, value)| self.expand_reference(*relation, value),
                |_, failure: MaterializeFailure| failure.report(),
            )
            .await;

        for (relation, value) in references {
            match value {
                Some(value) => {
                    response.insert(relation.field.clone(), value);
                }
                None => {
                    response.remove(&relation.field);
                }
            }
        }

        response
    }

    async fn expand_reference(
        &self,
        relation: &RelationDef,
        value: &mut Option<Value>,
    ) -> Result<(), MaterializeFailure> {
        match (&relation.cardinality, value) {
            (_, None) | (_, Some(Value::Null)) => Ok(()),
            (Cardinality::Many, Some(Value::Array(items))) => {
                let completion = Traversal::new(items.iter_mut())
                    .run(
                        |_, item| self.expand_element(relation, item),
                        |_, failure: MaterializeFailure| failure.report(),
                    )
                    .await;
                debug!(
                    field = %relation.field,
                    visited = completion.visited,
                    failed = completion.failed,
                    "Expanded reference collection"
                );
                Ok(())
            }
            (_, Some(single)) => self.expand_element(relation, single).await,
        }
    }

    /// Replace one foreign key with the projection of its document.
    async fn expand_element(
        &self,
        relation: &RelationDef,
        value: &mut Value,
    ) -> Result<(), MaterializeFailure> {
        if value.is_null() {
            return Ok(());
        }
        let id = Id::from_value(value);
        let target = self.target_model(relation, id)?;

        let unresolved = || MaterializeFailure::UnresolvedReference {
            field: relation.field.clone(),
            target: relation.target.clone(),
            id,
        };
        let id = id.ok_or_else(unresolved)?;

        let found = target
            .find_one(id)
            .await
            .map_err(|source| persistence(relation, source))?
            .ok_or_else(unresolved)?;

        *value = Value::Object(found.lightweight().await);
        Ok(())
    }

    fn target_model(
        &self,
        relation: &RelationDef,
        id: Option<Id>,
    ) -> Result<Arc<Model>, MaterializeFailure> {
        self.db
            .model(&relation.target)
            .ok_or_else(|| MaterializeFailure::UnresolvedReference {
                field: relation.field.clone(),
                target: relation.target.clone(),
                id,
            })
    }
}

fn persistence(relation: &RelationDef, source: crate::error::Error) -> MaterializeFailure {
    MaterializeFailure::Persistence {
        type_name: relation.target.clone(),
        field: Some(relation.field.clone()),
        source,
    }
}
