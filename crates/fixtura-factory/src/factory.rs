use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::try_join_all;
use serde_json::Value;
use tracing::{debug, info, warn};

use fixtura_core::{FactoryConfig, FixtureMap, FixtureSchema, ID_FIELD, Record, SchemaRegistry};
use fixtura_generate::{FakerOptions, ModelGenerator, Overrides, hash_seed};
use fixtura_store::{DocumentStore, MemoryStore, PostgresStore};

use crate::errors::{FactoryError, Result};
use crate::ledger::Ledger;

/// Creates fixtures in a document store and tracks what it created.
pub struct FixtureFactory {
    registry: SchemaRegistry,
    store: Arc<dyn DocumentStore>,
    generator: ModelGenerator,
    ledger: Mutex<Ledger>,
    base_seed: u64,
    calls: AtomicU64,
    clear_ledger_on_success: bool,
}

impl FixtureFactory {
    pub fn new(
        registry: SchemaRegistry,
        store: Arc<dyn DocumentStore>,
        config: &FactoryConfig,
    ) -> Self {
        let generator = ModelGenerator::with_options(FakerOptions::from(&config.generation));
        Self {
            registry,
            store,
            generator,
            ledger: Mutex::new(Ledger::new()),
            base_seed: config.generation.seed.unwrap_or_else(rand::random),
            calls: AtomicU64::new(0),
            clear_ledger_on_success: config.clear_ledger_on_success,
        }
    }

    /// Load the registry with the configured provider and connect the store.
    ///
    /// Without a `db` section the factory keeps documents in memory.
    pub async fn from_config(config: &FactoryConfig) -> Result<Self> {
        let provider = config.schema_provider()?;
        let registry = SchemaRegistry::load(provider.as_ref())?;
        let store: Arc<dyn DocumentStore> = match &config.db {
            Some(db) => Arc::new(PostgresStore::from_config(db).await?),
            None => {
                info!("no db configured, using in-memory store");
                Arc::new(MemoryStore::new())
            }
        };
        info!(
            fixtures = registry.len(),
            engine = store.engine(),
            "fixture factory ready"
        );
        Ok(Self::new(registry, store, config))
    }

    /// Replace the record generator.
    pub fn with_generator(mut self, generator: ModelGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn fixtures(&self) -> &FixtureMap {
        self.registry.as_map()
    }

    pub fn fixture(&self, name: &str) -> Option<&FixtureSchema> {
        self.registry.get(name)
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Create and persist one record of fixture `name`.
    pub async fn create(
        &self,
        name: &str,
        overrides: impl Into<Overrides>,
        refs: &[FixtureSchema],
    ) -> Result<Record> {
        let mut created = self.create_list(name, 1, overrides, refs).await?;
        created
            .pop()
            .ok_or_else(|| FactoryError::Configuration(format!("no record created for '{name}'")))
    }

    /// Create and persist `quantity` records of fixture `name` in one batch.
    ///
    /// An unregistered name falls back to the first external reference.
    pub async fn create_list(
        &self,
        name: &str,
        quantity: usize,
        overrides: impl Into<Overrides>,
        refs: &[FixtureSchema],
    ) -> Result<Vec<Record>> {
        let overrides = overrides.into();
        let schema = self
            .registry
            .get(name)
            .or_else(|| refs.first())
            .ok_or_else(|| FactoryError::NotFound(name.to_string()))?;
        self.validate_ids(&overrides)?;

        let call = self.calls.fetch_add(1, Ordering::Relaxed);
        let seed = hash_seed(self.base_seed, &format!("{name}#{call}"));
        let mut records = self
            .generator
            .generate(schema, quantity, &overrides, refs, seed)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        for record in &mut records {
            if !record.contains_key(ID_FIELD) {
                record.insert(ID_FIELD.to_string(), self.store.new_id());
            }
        }

        debug!(fixture = %name, count = records.len(), "inserting fixtures");
        let ids = self
            .store
            .insert(name, records.clone())
            .await
            .inspect_err(|err| warn!(fixture = %name, error = %err, "fixture insert failed"))?;
        for (record, id) in records.iter_mut().zip(&ids) {
            record.insert(ID_FIELD.to_string(), id.clone());
        }

        self.lock_ledger()?.record(name, ids);
        info!(fixture = %name, count = records.len(), "fixtures created");
        Ok(records)
    }

    /// Snapshot of every identifier created so far.
    pub fn created(&self) -> Result<Ledger> {
        Ok(self.lock_ledger()?.clone())
    }

    /// Identifiers created under `name`, or `None` if nothing was created.
    pub fn created_for(&self, name: &str) -> Result<Option<Vec<Value>>> {
        Ok(self.lock_ledger()?.get(name).map(<[Value]>::to_vec))
    }

    /// Remove every created record, one batched removal per fixture name.
    ///
    /// Removals run concurrently and the first failure is returned. On
    /// success the cleared identifiers leave the ledger unless
    /// `clear_ledger_on_success` is off.
    pub async fn clear_all(&self) -> Result<()> {
        let snapshot = self.created()?;
        if snapshot.is_empty() {
            return Ok(());
        }
        info!(collections = snapshot.names().len(), "clearing created fixtures");

        let removals = snapshot.iter().map(|(name, ids)| async move {
            self.store.remove(name, ids).await.map_err(|err| {
                warn!(fixture = %name, error = %err, "fixture removal failed");
                FactoryError::from(err)
            })
        });
        let removed: u64 = try_join_all(removals).await?.into_iter().sum();

        if self.clear_ledger_on_success {
            let mut ledger = self.lock_ledger()?;
            for (name, ids) in snapshot.iter() {
                ledger.release(name, ids);
            }
        }
        info!(removed, "created fixtures cleared");
        Ok(())
    }

    fn validate_ids(&self, overrides: &Overrides) -> Result<()> {
        for record in overrides.records() {
            if let Some(id) = record.get(ID_FIELD)
                && !self.store.is_native_id(id)
            {
                return Err(FactoryError::Validation(
                    "identifier must be of the store's native identifier type".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn lock_ledger(&self) -> Result<MutexGuard<'_, Ledger>> {
        self.ledger.lock().map_err(|_| FactoryError::Poisoned)
    }
}

impl fmt::Debug for FixtureFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixtureFactory")
            .field("fixtures", &self.registry.names().collect::<Vec<_>>())
            .field("engine", &self.store.engine())
            .field("clear_ledger_on_success", &self.clear_ledger_on_success)
            .finish_non_exhaustive()
    }
}
