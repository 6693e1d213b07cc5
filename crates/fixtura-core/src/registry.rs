use std::collections::BTreeMap;

use tracing::debug;

use crate::error::Result;
use crate::provider::SchemaProvider;
use crate::schema::FixtureSchema;

/// Mapping from fixture name to schema, as produced by one provider unit.
pub type FixtureMap = BTreeMap<String, FixtureSchema>;

/// Read-only lookup of fixture schemas by name.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: FixtureMap,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a single provider.
    pub fn load(provider: &dyn SchemaProvider) -> Result<Self> {
        let mut registry = Self::new();
        registry.merge(provider.load()?);
        Ok(registry)
    }

    /// Merge a unit into the registry. A later entry for an existing name
    /// replaces the earlier one.
    pub fn merge(&mut self, fixtures: FixtureMap) {
        for (name, schema) in fixtures {
            if self.schemas.insert(name.clone(), schema).is_some() {
                debug!(fixture = %name, "fixture schema overwritten");
            }
        }
    }

    pub fn insert(
        &mut self,
        name: impl Into<String>,
        schema: FixtureSchema,
    ) -> Option<FixtureSchema> {
        self.schemas.insert(name.into(), schema)
    }

    pub fn get(&self, name: &str) -> Option<&FixtureSchema> {
        self.schemas.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    pub fn as_map(&self) -> &FixtureMap {
        &self.schemas
    }
}

impl From<FixtureMap> for SchemaRegistry {
    fn from(schemas: FixtureMap) -> Self {
        Self { schemas }
    }
}
