use serde_json::Value;

use fixtura_core::{FixtureSchema, Record};

use crate::errors::GenerationError;

/// Caller-supplied field values layered over generated records.
///
/// `Single` applies to every record; `Cycle` applies positionally and wraps
/// around, so record `i` receives override `i % len`.
#[derive(Debug, Clone, PartialEq)]
pub enum Overrides {
    Single(Record),
    Cycle(Vec<Record>),
}

impl Default for Overrides {
    fn default() -> Self {
        Overrides::Single(Record::new())
    }
}

impl Overrides {
    /// No overrides: records are kept as generated.
    pub fn none() -> Self {
        Self::default()
    }

    /// Override object applied to the record at `index`.
    pub fn for_index(&self, index: usize) -> Option<&Record> {
        match self {
            Overrides::Single(record) => Some(record),
            Overrides::Cycle(records) if records.is_empty() => None,
            Overrides::Cycle(records) => records.get(index % records.len()),
        }
    }

    /// Every override object, in order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        let records: &[Record] = match self {
            Overrides::Single(record) => std::slice::from_ref(record),
            Overrides::Cycle(records) => records,
        };
        records.iter()
    }

    pub fn validate(&self) -> Result<(), GenerationError> {
        match self {
            Overrides::Cycle(records) if records.is_empty() => Err(GenerationError::Configuration(
                "override sequence must contain at least one object".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

impl From<Record> for Overrides {
    fn from(record: Record) -> Self {
        Overrides::Single(record)
    }
}

impl From<Vec<Record>> for Overrides {
    fn from(records: Vec<Record>) -> Self {
        Overrides::Cycle(records)
    }
}

impl TryFrom<Value> for Overrides {
    type Error = GenerationError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Ok(Overrides::none()),
            Value::Object(record) => Ok(Overrides::Single(record)),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(record) => Ok(record),
                    _ => Err(GenerationError::Configuration(
                        "override sequence must only contain objects".to_string(),
                    )),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Overrides::Cycle),
            _ => Err(GenerationError::Configuration(
                "overrides must be an object or an array of objects".to_string(),
            )),
        }
    }
}

/// Schemas available to resolve cross-schema `$ref` pointers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExternalRefs(Vec<FixtureSchema>);

impl ExternalRefs {
    pub fn new(schemas: Vec<FixtureSchema>) -> Self {
        Self(schemas)
    }

    pub fn as_slice(&self) -> &[FixtureSchema] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<FixtureSchema> {
        self.0
    }
}

impl TryFrom<Value> for ExternalRefs {
    type Error = GenerationError;

    /// Elements are taken as-is; invalid entries surface when a record is generated.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::Array(items) => Ok(Self(items.into_iter().map(FixtureSchema::new).collect())),
            _ => Err(GenerationError::Configuration(
                "external references must be an array of schemas".to_string(),
            )),
        }
    }
}
