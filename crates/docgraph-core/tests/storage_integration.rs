//! Integration tests for document storage, the catalog and validation.

use docgraph_core::validate::{apply_defaults, validate};
use docgraph_core::{
    Catalog, DefaultValue, Document, Error, FieldDef, FieldType, Id, RelationDef, ScalarType,
    StorageConfig, StorageEngine, TypeDef,
};
use serde_json::json;

struct TestContext {
    storage: StorageEngine,
    catalog: Catalog,
    _dir: tempfile::TempDir,
}

impl TestContext {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageEngine::open(StorageConfig::new(dir.path())).unwrap();
        let catalog = Catalog::open(storage.db()).unwrap();
        Self {
            storage,
            catalog,
            _dir: dir,
        }
    }
}

fn blog_types() -> (TypeDef, TypeDef) {
    let author = TypeDef::new("Author")
        .with_field(FieldDef::new("name", FieldType::scalar(ScalarType::String)))
        .with_field(
            FieldDef::optional_scalar("karma", ScalarType::Int64)
                .with_default(DefaultValue::Int(0)),
        );

    let post = TypeDef::new("Post")
        .with_field(FieldDef::new("title", FieldType::scalar(ScalarType::String)))
        .with_field(FieldDef::new("author", FieldType::reference("Author")))
        .with_field(FieldDef::optional("tags", FieldType::array_scalar(ScalarType::String)))
        .with_relation(RelationDef::one("Author", "author", "Author"));

    (author, post)
}

fn doc(value: serde_json::Value) -> Document {
    value.as_object().unwrap().clone()
}

#[test]
fn test_validated_documents_round_trip() {
    let ctx = TestContext::new();
    let (author, post) = blog_types();
    ctx.catalog.register(author.clone()).unwrap();
    ctx.catalog.register(post.clone()).unwrap();

    let author_id = Id::generate();
    let mut a = doc(json!({ "id": author_id, "name": "Ada" }));
    apply_defaults(&author, &mut a);
    validate(&author, &a).unwrap();
    ctx.storage.put_document("Author", author_id, &a).unwrap();

    let post_id = Id::generate();
    let p = doc(json!({ "id": post_id, "title": "Hello", "author": author_id, "tags": ["a"] }));
    validate(&post, &p).unwrap();
    ctx.storage.put_document("Post", post_id, &p).unwrap();

    let stored = ctx.storage.get_document("Author", author_id).unwrap().unwrap();
    assert_eq!(stored.get("karma"), Some(&json!(0)));

    let stored_post = ctx.storage.get_document("Post", post_id).unwrap().unwrap();
    let def = ctx.catalog.get("Post").unwrap();
    let relation = &def.relations[0];
    let target = stored_post.get(&relation.field).and_then(Id::from_value).unwrap();
    assert_eq!(target, author_id);
    assert!(ctx.storage.get_document(&relation.target, target).unwrap().is_some());
}

#[test]
fn test_invalid_documents_rejected() {
    let (author, post) = blog_types();

    let err = validate(&author, &doc(json!({ "karma": 1 }))).unwrap_err();
    assert!(matches!(err, Error::Validation { ref field, .. } if field == "name"));

    let embedded = doc(json!({ "title": "t", "author": { "name": "Ada" } }));
    assert!(validate(&post, &embedded).is_err());

    let bad_tags = doc(json!({ "title": "t", "author": Id::generate(), "tags": [1] }));
    assert!(validate(&post, &bad_tags).is_err());
}

#[test]
fn test_versions_and_deletes() {
    let ctx = TestContext::new();
    let id = Id::generate();

    let v1 = ctx
        .storage
        .put_document("Author", id, &doc(json!({ "name": "a" })))
        .unwrap();
    let v2 = ctx
        .storage
        .put_document("Author", id, &doc(json!({ "name": "b" })))
        .unwrap();
    assert!(v2 > v1);

    let versions: Vec<_> = ctx
        .storage
        .scan_versions(id)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(versions.len(), 2);

    let names: Vec<_> = ctx
        .storage
        .scan_type("Author")
        .map(|r| r.unwrap().1["name"].clone())
        .collect();
    assert_eq!(names, vec![json!("b")]);

    assert!(ctx.storage.delete_document("Author", id).unwrap());
    assert!(ctx.storage.get_document("Author", id).unwrap().is_none());
    assert_eq!(ctx.storage.scan_type("Author").count(), 0);
    assert_eq!(ctx.storage.version_count(id).unwrap(), 0);
}

#[test]
fn test_catalog_and_documents_share_reopened_db() {
    let dir = tempfile::tempdir().unwrap();
    let id = Id::generate();
    let (author, _) = blog_types();

    {
        let storage = StorageEngine::open(StorageConfig::new(dir.path())).unwrap();
        let catalog = Catalog::open(storage.db()).unwrap();
        catalog.register(author).unwrap();
        storage
            .put_document("Author", id, &doc(json!({ "name": "Ada" })))
            .unwrap();
        catalog.flush().unwrap();
        storage.flush().unwrap();
    }

    let storage = StorageEngine::open(StorageConfig::new(dir.path())).unwrap();
    let catalog = Catalog::open(storage.db()).unwrap();
    assert!(storage.was_recovered());
    assert_eq!(catalog.list_types(), vec!["Author".to_string()]);
    assert!(storage.get_document("Author", id).unwrap().is_some());
}
