use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use fixtura_core::{ID_FIELD, Record};

use crate::adapter::DocumentStore;
use crate::errors::{Result, StoreError};

type Collection = BTreeMap<String, Record>;

/// In-process store keyed by collection name, then by UUID string.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<BTreeMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a stored document by identifier.
    pub fn get(&self, collection: &str, id: &Value) -> Result<Option<Record>> {
        let collections = self.collections.lock().map_err(|_| StoreError::Poisoned)?;
        let Some(key) = native_key(id) else {
            return Ok(None);
        };
        Ok(collections
            .get(collection)
            .and_then(|documents| documents.get(&key))
            .cloned())
    }

    /// Number of documents currently held in `collection`.
    pub fn len(&self, collection: &str) -> Result<usize> {
        let collections = self.collections.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(collections.get(collection).map_or(0, BTreeMap::len))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn engine(&self) -> &'static str {
        "memory"
    }

    fn is_native_id(&self, id: &Value) -> bool {
        native_key(id).is_some()
    }

    fn new_id(&self) -> Value {
        Value::String(Uuid::new_v4().to_string())
    }

    async fn insert(&self, collection: &str, documents: Vec<Record>) -> Result<Vec<Value>> {
        let mut collections = self.collections.lock().map_err(|_| StoreError::Poisoned)?;
        let existing = collections.get(collection);

        let mut batch = Vec::with_capacity(documents.len());
        let mut seen = HashSet::new();
        for mut document in documents {
            let key = match document.get(ID_FIELD) {
                Some(id) => native_key(id).ok_or_else(|| StoreError::InvalidId {
                    id: id.to_string(),
                })?,
                None => Uuid::new_v4().to_string(),
            };
            let taken = existing.is_some_and(|documents| documents.contains_key(&key));
            if taken || !seen.insert(key.clone()) {
                return Err(StoreError::DuplicateId {
                    collection: collection.to_string(),
                    id: key,
                });
            }
            document.insert(ID_FIELD.to_string(), Value::String(key.clone()));
            batch.push((key, document));
        }

        let documents = collections.entry(collection.to_string()).or_default();
        let mut ids = Vec::with_capacity(batch.len());
        for (key, document) in batch {
            ids.push(Value::String(key.clone()));
            documents.insert(key, document);
        }
        debug!(collection, count = ids.len(), "documents inserted");
        Ok(ids)
    }

    async fn remove(&self, collection: &str, ids: &[Value]) -> Result<u64> {
        let mut collections = self.collections.lock().map_err(|_| StoreError::Poisoned)?;
        let Some(documents) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let removed = ids
            .iter()
            .filter_map(native_key)
            .filter(|key| documents.remove(key).is_some())
            .count();
        debug!(collection, removed, "documents removed");
        Ok(removed as u64)
    }

    async fn count(&self, collection: &str, ids: &[Value]) -> Result<u64> {
        let collections = self.collections.lock().map_err(|_| StoreError::Poisoned)?;
        let Some(documents) = collections.get(collection) else {
            return Ok(0);
        };
        let keys: HashSet<String> = ids.iter().filter_map(native_key).collect();
        Ok(keys.iter().filter(|key| documents.contains_key(*key)).count() as u64)
    }
}

/// Canonical UUID string for `id`, or `None` when it is not a UUID string.
fn native_key(id: &Value) -> Option<String> {
    id.as_str()
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .map(|uuid| uuid.to_string())
}
