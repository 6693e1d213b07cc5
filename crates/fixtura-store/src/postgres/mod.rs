use std::collections::HashSet;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{debug, info};
use uuid::Uuid;

use fixtura_core::{DbConfig, ID_FIELD, Record};

use crate::adapter::DocumentStore;
use crate::errors::{Result, StoreError};

mod queries;

const MAX_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Stores each collection as a `(id uuid, doc jsonb)` table.
#[derive(Debug)]
pub struct PostgresStore {
    pool: PgPool,
    tables: Mutex<HashSet<String>>,
}

impl PostgresStore {
    /// Create a store using a pre-configured pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            tables: Mutex::new(HashSet::new()),
        }
    }

    /// Connect to the database at `url`.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(url)
            .await
            .map_err(queries::db_error)?;
        Ok(Self::new(pool))
    }

    /// Connect using the `db` section of the factory configuration.
    pub async fn from_config(config: &DbConfig) -> Result<Self> {
        info!(endpoint = %config.redacted()?, "connecting to document store");
        Self::connect(&config.url("postgres")?).await
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn ensure_table(&self, collection: &str) -> Result<()> {
        validate_collection(collection)?;
        if self.is_known(collection)? {
            return Ok(());
        }

        queries::create_table(&self.pool, collection).await?;
        self.remember(collection)?;
        debug!(collection, "collection table ready");
        Ok(())
    }

    /// Whether `collection` has a table. Never creates one.
    async fn has_table(&self, collection: &str) -> Result<bool> {
        validate_collection(collection)?;
        if self.is_known(collection)? {
            return Ok(true);
        }

        let exists = queries::table_exists(&self.pool, collection).await?;
        if exists {
            self.remember(collection)?;
        }
        Ok(exists)
    }

    fn is_known(&self, collection: &str) -> Result<bool> {
        Ok(self
            .tables
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .contains(collection))
    }

    fn remember(&self, collection: &str) -> Result<()> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .insert(collection.to_string());
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PostgresStore {
    fn engine(&self) -> &'static str {
        "postgres"
    }

    fn is_native_id(&self, id: &Value) -> bool {
        parse_id(id).is_some()
    }

    fn new_id(&self) -> Value {
        Value::String(Uuid::new_v4().to_string())
    }

    async fn insert(&self, collection: &str, documents: Vec<Record>) -> Result<Vec<Value>> {
        self.ensure_table(collection).await?;

        let mut rows = Vec::with_capacity(documents.len());
        for mut document in documents {
            let id = match document.get(ID_FIELD) {
                Some(id) => parse_id(id).ok_or_else(|| StoreError::InvalidId {
                    id: id.to_string(),
                })?,
                None => Uuid::new_v4(),
            };
            document.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
            rows.push((id, Value::Object(document)));
        }

        queries::insert_documents(&self.pool, collection, &rows).await?;
        debug!(collection, count = rows.len(), "documents inserted");
        Ok(rows
            .into_iter()
            .map(|(id, _)| Value::String(id.to_string()))
            .collect())
    }

    async fn remove(&self, collection: &str, ids: &[Value]) -> Result<u64> {
        if !self.has_table(collection).await? {
            debug!(collection, "no table, nothing to remove");
            return Ok(0);
        }
        let ids: Vec<Uuid> = ids.iter().filter_map(parse_id).collect();
        let removed = queries::delete_documents(&self.pool, collection, &ids).await?;
        debug!(collection, removed, "documents removed");
        Ok(removed)
    }

    async fn count(&self, collection: &str, ids: &[Value]) -> Result<u64> {
        if !self.has_table(collection).await? {
            return Ok(0);
        }
        let ids: Vec<Uuid> = ids.iter().filter_map(parse_id).collect();
        queries::count_documents(&self.pool, collection, &ids).await
    }
}

fn parse_id(id: &Value) -> Option<Uuid> {
    id.as_str().and_then(|raw| Uuid::parse_str(raw).ok())
}

/// Collection names become table names, so only plain identifiers pass.
fn validate_collection(collection: &str) -> Result<()> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let valid = PATTERN
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").ok())
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(collection));
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidCollection(collection.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn collection_names_are_plain_identifiers() {
        assert!(validate_collection("user").is_ok());
        assert!(validate_collection("_tags_2").is_ok());
        for bad in ["", "2fast", "user; drop table x", "a-b", "\"quoted\""] {
            assert!(matches!(
                validate_collection(bad),
                Err(StoreError::InvalidCollection(_))
            ));
        }
    }

    #[tokio::test]
    async fn lookups_validate_names_before_querying() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://fixtura@127.0.0.1:1/unreachable")
            .expect("lazy pool");
        let store = PostgresStore::new(pool);

        assert!(matches!(
            store.count("a-b", &[]).await,
            Err(StoreError::InvalidCollection(_))
        ));
        assert!(matches!(
            store.remove("user; drop table x", &[]).await,
            Err(StoreError::InvalidCollection(_))
        ));
        assert!(store.tables.lock().expect("tables").is_empty());
    }

    #[test]
    fn only_uuid_strings_are_native() {
        let id = Uuid::new_v4().to_string();
        assert_eq!(parse_id(&json!(id)), Uuid::parse_str(&id).ok());
        assert!(parse_id(&json!(42)).is_none());
        assert!(parse_id(&json!("42")).is_none());
    }
}
