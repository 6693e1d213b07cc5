//! Fixture schema providers.
//!
//! A provider turns some source of fixture definitions into a [`FixtureMap`].
//! The factory only ever sees the merged result, never the source itself.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::registry::FixtureMap;
use crate::schema::FixtureSchema;

/// A source of fixture schemas.
pub trait SchemaProvider {
    /// Load every fixture this provider knows about.
    fn load(&self) -> Result<FixtureMap>;
}

/// Scans a directory where every `.json` / `.toml` file maps fixture names to
/// schemas. Files are merged in file-name order; other entries are skipped.
#[derive(Debug, Clone)]
pub struct DirectoryProvider {
    root: PathBuf,
}

impl DirectoryProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SchemaProvider for DirectoryProvider {
    fn load(&self) -> Result<FixtureMap> {
        let entries = fs::read_dir(&self.root).map_err(|err| Error::io(&self.root, err))?;
        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| Error::io(&self.root, err))?;
            let path = entry.path();
            if path.is_file() && source_format(&path).is_some() {
                paths.push(path);
            } else {
                debug!(path = %path.display(), "skipping non-fixture entry");
            }
        }
        paths.sort();

        let mut fixtures = FixtureMap::new();
        for path in paths {
            let unit = fixture_unit(&path, read_source(&path)?)?;
            debug!(path = %path.display(), fixtures = unit.len(), "loaded fixture unit");
            fixtures.extend(unit);
        }
        Ok(fixtures)
    }
}

/// Reads a single model registry file.
///
/// The file is an object of models. A model that carries a `fixtures` object
/// contributes those fixtures; models without one are ignored.
#[derive(Debug, Clone)]
pub struct ModelRegistryProvider {
    path: PathBuf,
}

impl ModelRegistryProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SchemaProvider for ModelRegistryProvider {
    fn load(&self) -> Result<FixtureMap> {
        let document = read_source(&self.path)?;
        let Value::Object(models) = document else {
            return Err(Error::InvalidSchema(format!(
                "{}: model registry must be an object of models",
                self.path.display()
            )));
        };

        let mut fixtures = FixtureMap::new();
        for (model, definition) in models {
            match definition.get("fixtures") {
                None => debug!(model = %model, "model exposes no fixtures"),
                Some(Value::Object(map)) => {
                    for (name, schema) in map {
                        fixtures.insert(name.clone(), FixtureSchema::new(schema.clone()));
                    }
                }
                Some(_) => {
                    return Err(Error::InvalidSchema(format!(
                        "{}: fixtures of model '{model}' must be an object",
                        self.path.display()
                    )));
                }
            }
        }
        Ok(fixtures)
    }
}

type FixtureUnit = Box<dyn Fn() -> FixtureMap + Send + Sync>;

/// In-code registry of fixture units, merged in registration order.
#[derive(Default)]
pub struct StaticRegistry {
    units: Vec<FixtureUnit>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(mut self, unit: F) -> Self
    where
        F: Fn() -> FixtureMap + Send + Sync + 'static,
    {
        self.units.push(Box::new(unit));
        self
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl fmt::Debug for StaticRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticRegistry")
            .field("units", &self.units.len())
            .finish()
    }
}

impl SchemaProvider for StaticRegistry {
    fn load(&self) -> Result<FixtureMap> {
        let mut fixtures = FixtureMap::new();
        for unit in &self.units {
            fixtures.extend(unit());
        }
        Ok(fixtures)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SourceFormat {
    Json,
    Toml,
}

fn source_format(path: &Path) -> Option<SourceFormat> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Some(SourceFormat::Json),
        Some("toml") => Some(SourceFormat::Toml),
        _ => None,
    }
}

/// Read a JSON or TOML document, picking the format from the extension.
pub(crate) fn read_source(path: &Path) -> Result<Value> {
    let format = source_format(path).ok_or_else(|| {
        Error::Config(format!(
            "{}: expected a .json or .toml file",
            path.display()
        ))
    })?;
    let content = fs::read_to_string(path).map_err(|err| Error::io(path, err))?;
    let value = match format {
        SourceFormat::Json => serde_json::from_str(&content)?,
        SourceFormat::Toml => toml::from_str(&content)?,
    };
    Ok(value)
}

fn fixture_unit(path: &Path, document: Value) -> Result<FixtureMap> {
    match document {
        Value::Object(map) => Ok(map
            .into_iter()
            .map(|(name, schema)| (name, FixtureSchema::new(schema)))
            .collect()),
        _ => Err(Error::InvalidSchema(format!(
            "{}: fixture file must map fixture names to schemas",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn static_registry_merges_units_in_order() {
        let registry = StaticRegistry::new()
            .register(|| {
                let mut map = FixtureMap::new();
                map.insert("user".to_string(), FixtureSchema::new(json!({"v": 1})));
                map
            })
            .register(|| {
                let mut map = FixtureMap::new();
                map.insert("user".to_string(), FixtureSchema::new(json!({"v": 2})));
                map.insert("tags".to_string(), FixtureSchema::new(json!({"v": 3})));
                map
            });

        let fixtures = registry.load().expect("load static registry");
        assert_eq!(fixtures.len(), 2);
        assert_eq!(fixtures["user"].as_value()["v"], 2);
    }

    #[test]
    fn unknown_extensions_are_rejected_by_read_source() {
        let err = read_source(Path::new("fixtures/user.yaml")).expect_err("yaml is unsupported");
        assert!(matches!(err, Error::Config(_)));
    }
}
