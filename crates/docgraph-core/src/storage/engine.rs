//! Storage engine implementation.

use super::{Record, RetentionPolicy, StorageConfig, VersionedKey};
use crate::document::Document;
use crate::error::Error;
use crate::id::{Id, ID_SIZE};
use sled::{Db, IVec, Tree};
use tracing::trace;

/// Tree name for document data.
const DATA_TREE: &str = "data";

/// Tree name for metadata (latest versions).
const META_TREE: &str = "meta";

/// Tree name for the type index.
const TYPE_INDEX_TREE: &str = "index:type";

/// Prefix for latest version pointers in meta tree.
const LATEST_PREFIX: &[u8] = b"latest:";

/// Versioned document store on top of sled.
///
/// Every save writes a new version and prunes versions beyond the
/// [`RetentionPolicy`]; reads return the latest one. Deletes remove every
/// version along with the latest pointer and the type index entry.
pub struct StorageEngine {
    /// The underlying sled database.
    db: Db,

    /// Tree for document data (versioned records).
    data_tree: Tree,

    /// Tree for metadata.
    meta_tree: Tree,

    /// Tree for type index (type name + id -> empty).
    type_index_tree: Tree,

    /// How many versions are kept per document.
    retention: RetentionPolicy,
}

impl StorageEngine {
    /// Open or create a storage engine with the given configuration.
    pub fn open(config: StorageConfig) -> Result<Self, Error> {
        let db = config.to_sled_config().open()?;
        Self::with_db(db, config.retention)
    }

    /// Build a storage engine over an already opened sled database.
    pub fn with_db(db: Db, retention: RetentionPolicy) -> Result<Self, Error> {
        let data_tree = db.open_tree(DATA_TREE)?;
        let meta_tree = db.open_tree(META_TREE)?;
        let type_index_tree = db.open_tree(TYPE_INDEX_TREE)?;

        Ok(Self {
            db,
            data_tree,
            meta_tree,
            type_index_tree,
            retention,
        })
    }

    /// Check if the database was recovered from a previous crash.
    pub fn was_recovered(&self) -> bool {
        self.db.was_recovered()
    }

    /// Store a new version of a document. Returns the version timestamp.
    pub fn put_document(&self, type_name: &str, id: Id, doc: &Document) -> Result<u64, Error> {
        let record = Record::new(type_name, doc)?;
        let version_ts = self.put(id, record)?;

        self.type_index_tree
            .insert(self.type_index_key(type_name, &id), &[])?;

        Ok(version_ts)
    }

    /// Get the latest version of a document of the given type.
    ///
    /// Documents stored under a different type are not returned.
    pub fn get_document(&self, type_name: &str, id: Id) -> Result<Option<Document>, Error> {
        match self.get_latest(id)? {
            Some((_, record)) if record.type_name == type_name => Ok(Some(record.document()?)),
            _ => Ok(None),
        }
    }

    /// Delete a document of the given type with all of its versions.
    ///
    /// Returns false if no such document exists.
    pub fn delete_document(&self, type_name: &str, id: Id) -> Result<bool, Error> {
        match self.get_latest(id)? {
            Some((_, record)) if record.type_name == type_name => {}
            _ => return Ok(false),
        }

        let keys = self.version_keys(id)?;
        for key in &keys {
            self.data_tree.remove(key)?;
        }
        self.meta_tree.remove(self.latest_key(&id))?;
        self.type_index_tree
            .remove(self.type_index_key(type_name, &id))?;

        trace!(type_name, id = %id, versions = keys.len(), "Deleted document");
        Ok(true)
    }

    /// Number of stored versions of a document.
    pub fn version_count(&self, id: Id) -> Result<usize, Error> {
        Ok(self.version_keys(id)?.len())
    }

    /// Get the latest version of a document.
    pub fn get_latest(&self, id: Id) -> Result<Option<(u64, Record)>, Error> {
        let version_ts = match self.latest_version(id)? {
            Some(ts) => ts,
            None => return Ok(None),
        };

        match self.data_tree.get(VersionedKey::new(id, version_ts).encode())? {
            Some(bytes) => Ok(Some((version_ts, Record::from_bytes(&bytes)?))),
            None => Ok(None),
        }
    }

    /// Scan all versions of a document, oldest first.
    pub fn scan_versions(&self, id: Id) -> impl Iterator<Item = Result<(u64, Record), Error>> + '_ {
        let min_key = VersionedKey::min_for(id);
        let max_key = VersionedKey::max_for(id);

        self.data_tree
            .range(min_key.encode()..=max_key.encode())
            .map(move |result| {
                let (key_bytes, value_bytes) = result?;
                let key = VersionedKey::decode(&key_bytes).ok_or(Error::InvalidKey)?;
                if key.id != id {
                    return Err(Error::InvalidKey);
                }
                let record = Record::from_bytes(&value_bytes)?;
                Ok((key.version_ts, record))
            })
    }

    /// Scan the latest live version of every document of a type.
    pub fn scan_type(
        &self,
        type_name: &str,
    ) -> impl Iterator<Item = Result<(Id, Document), Error>> + '_ {
        let prefix = self.type_index_prefix(type_name);
        let prefix_len = prefix.len();
        let type_name = type_name.to_string();

        self.type_index_tree
            .scan_prefix(&prefix)
            .filter_map(move |result| {
                let key = match result {
                    Ok((key, _)) => key,
                    Err(e) => return Some(Err(e.into())),
                };
                if key.len() != prefix_len + ID_SIZE {
                    return Some(Err(Error::InvalidKey));
                }
                let mut bytes = [0u8; ID_SIZE];
                bytes.copy_from_slice(&key[prefix_len..]);
                let id = Id::from_bytes(bytes);

                match self.get_document(&type_name, id) {
                    Ok(Some(doc)) => Some(Ok((id, doc))),
                    Ok(None) => None,
                    Err(e) => Some(Err(e)),
                }
            })
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), Error> {
        self.db.flush()?;
        Ok(())
    }

    /// Get the underlying sled database (for opening new trees).
    pub fn db(&self) -> &Db {
        &self.db
    }

    /// Write a record as the newest version of a document.
    ///
    /// Version timestamps are strictly increasing per document even when two
    /// writes land in the same microsecond.
    fn put(&self, id: Id, record: Record) -> Result<u64, Error> {
        let mut key = VersionedKey::now(id);
        if let Some(latest) = self.latest_version(id)? {
            if key.version_ts <= latest {
                key.version_ts = latest + 1;
            }
        }

        self.data_tree.insert(key.encode(), record.to_bytes()?)?;
        self.meta_tree
            .insert(self.latest_key(&id), &key.version_ts.to_be_bytes())?;
        self.prune(id)?;

        Ok(key.version_ts)
    }

    /// Remove the oldest versions of a document beyond the retention limit.
    fn prune(&self, id: Id) -> Result<usize, Error> {
        let Some(max_versions) = self.retention.max_versions else {
            return Ok(0);
        };

        let keys = self.version_keys(id)?;
        let excess = keys.len().saturating_sub(max_versions.max(1));
        for key in keys.iter().take(excess) {
            self.data_tree.remove(key)?;
        }

        if excess > 0 {
            trace!(id = %id, pruned = excess, "Pruned old versions");
        }
        Ok(excess)
    }

    /// Data keys of every version of a document, oldest first.
    fn version_keys(&self, id: Id) -> Result<Vec<IVec>, Error> {
        let min_key = VersionedKey::min_for(id);
        let max_key = VersionedKey::max_for(id);

        let keys = self
            .data_tree
            .range(min_key.encode()..=max_key.encode())
            .keys()
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }

    /// Read the latest version pointer for a document.
    fn latest_version(&self, id: Id) -> Result<Option<u64>, Error> {
        match self.meta_tree.get(self.latest_key(&id))? {
            Some(bytes) => {
                if bytes.len() != 8 {
                    return Err(Error::InvalidKey);
                }
                let mut ts_bytes = [0u8; 8];
                ts_bytes.copy_from_slice(&bytes);
                Ok(Some(u64::from_be_bytes(ts_bytes)))
            }
            None => Ok(None),
        }
    }

    /// Get the metadata key for the latest version pointer.
    fn latest_key(&self, id: &Id) -> Vec<u8> {
        let mut key = Vec::with_capacity(LATEST_PREFIX.len() + ID_SIZE);
        key.extend_from_slice(LATEST_PREFIX);
        key.extend_from_slice(id.as_bytes());
        key
    }

    /// Get the index key for a type + id.
    fn type_index_key(&self, type_name: &str, id: &Id) -> Vec<u8> {
        let mut key = self.type_index_prefix(type_name);
        key.extend_from_slice(id.as_bytes());
        key
    }

    /// Get the prefix for scanning all documents of a type.
    fn type_index_prefix(&self, type_name: &str) -> Vec<u8> {
        let mut prefix = Vec::with_capacity(type_name.len() + 1 + ID_SIZE);
        prefix.extend_from_slice(type_name.as_bytes());
        prefix.push(0); // Null separator
        prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct TestDb {
        engine: StorageEngine,
        _dir: tempfile::TempDir, // Keep the temp dir alive
    }

    impl std::ops::Deref for TestDb {
        type Target = StorageEngine;
        fn deref(&self) -> &Self::Target {
            &self.engine
        }
    }

    fn test_engine() -> TestDb {
        let dir = tempfile::tempdir().unwrap();
        let engine = StorageEngine::open(StorageConfig::new(dir.path())).unwrap();
        TestDb { engine, _dir: dir }
    }

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_put_and_get() {
        let engine = test_engine();
        let id = Id::generate();

        engine
            .put_document("Leaf", id, &doc(json!({ "name": "x" })))
            .unwrap();

        let found = engine.get_document("Leaf", id).unwrap().unwrap();
        assert_eq!(found["name"], "x");
    }

    #[test]
    fn test_type_mismatch_is_absent() {
        let engine = test_engine();
        let id = Id::generate();
        engine.put_document("Leaf", id, &doc(json!({}))).unwrap();

        assert!(engine.get_document("Root", id).unwrap().is_none());
        assert!(engine.get_document("Leaf", Id::generate()).unwrap().is_none());
    }

    #[test]
    fn test_versions_are_kept() {
        let engine = test_engine();
        let id = Id::generate();

        let v1 = engine.put_document("Leaf", id, &doc(json!({ "n": 1 }))).unwrap();
        let v2 = engine.put_document("Leaf", id, &doc(json!({ "n": 2 }))).unwrap();
        assert!(v2 > v1);

        let versions: Vec<_> = engine.scan_versions(id).collect::<Result<_, _>>().unwrap();
        assert_eq!(versions.len(), 2);
        assert_eq!(engine.get_document("Leaf", id).unwrap().unwrap()["n"], 2);
    }

    #[test]
    fn test_retention_prunes_old_versions() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig::new(dir.path()).with_retention(RetentionPolicy::max_versions(3));
        let engine = StorageEngine::open(config).unwrap();
        let id = Id::generate();

        for n in 0..50 {
            engine.put_document("Leaf", id, &doc(json!({ "n": n }))).unwrap();
        }

        assert_eq!(engine.version_count(id).unwrap(), 3);
        let kept: Vec<_> = engine
            .scan_versions(id)
            .map(|r| r.unwrap().1.document().unwrap()["n"].clone())
            .collect();
        assert_eq!(kept, vec![json!(47), json!(48), json!(49)]);
    }

    #[test]
    fn test_keep_all_retention() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig::new(dir.path()).with_retention(RetentionPolicy::keep_all());
        let engine = StorageEngine::open(config).unwrap();
        let id = Id::generate();

        for n in 0..10 {
            engine.put_document("Leaf", id, &doc(json!({ "n": n }))).unwrap();
        }
        assert_eq!(engine.version_count(id).unwrap(), 10);
    }

    #[test]
    fn test_delete_reclaims_everything() {
        let engine = test_engine();
        let id = Id::generate();
        engine.put_document("Leaf", id, &doc(json!({ "n": 1 }))).unwrap();
        engine.put_document("Leaf", id, &doc(json!({ "n": 2 }))).unwrap();

        // Wrong type leaves the document alone.
        assert!(!engine.delete_document("Root", id).unwrap());
        assert!(engine.delete_document("Leaf", id).unwrap());
        assert!(!engine.delete_document("Leaf", id).unwrap());

        assert!(engine.get_document("Leaf", id).unwrap().is_none());
        assert!(engine.get_latest(id).unwrap().is_none());
        assert_eq!(engine.version_count(id).unwrap(), 0);
        assert_eq!(engine.type_index_tree.len(), 0);
        assert_eq!(engine.meta_tree.len(), 0);
    }

    #[test]
    fn test_scan_type() {
        let engine = test_engine();
        let a = Id::generate();
        let b = Id::generate();
        let gone = Id::generate();

        engine.put_document("Leaf", a, &doc(json!({ "name": "a" }))).unwrap();
        engine.put_document("Leaf", b, &doc(json!({ "name": "b" }))).unwrap();
        engine.put_document("Leaf", gone, &doc(json!({}))).unwrap();
        engine.put_document("Root", Id::generate(), &doc(json!({}))).unwrap();
        engine.delete_document("Leaf", gone).unwrap();

        let leaves: Vec<_> = engine.scan_type("Leaf").collect::<Result<_, _>>().unwrap();
        assert_eq!(leaves.len(), 2);
        assert!(leaves.iter().all(|(id, _)| *id == a || *id == b));
    }

    #[test]
    fn test_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let id = Id::generate();

        {
            let engine = StorageEngine::open(StorageConfig::new(dir.path())).unwrap();
            engine.put_document("Leaf", id, &doc(json!({ "name": "kept" }))).unwrap();
            engine.flush().unwrap();
        }

        let engine = StorageEngine::open(StorageConfig::new(dir.path())).unwrap();
        assert_eq!(engine.get_document("Leaf", id).unwrap().unwrap()["name"], "kept");
    }
}
