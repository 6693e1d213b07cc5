//! Core contracts and helpers for fixtura.
//!
//! This crate defines the fixture schema type, the fixture registry and the
//! providers that populate it, plus the configuration document shared by the
//! generator, store adapters and the factory.

pub mod config;
pub mod error;
pub mod provider;
pub mod registry;
pub mod schema;

pub use config::{
    DbConfig, DbOptions, FactoryConfig, GenerationConfig, LoggingConfig, config_json_schema,
};
pub use error::{Error, Result};
pub use provider::{DirectoryProvider, ModelRegistryProvider, SchemaProvider, StaticRegistry};
pub use registry::{FixtureMap, SchemaRegistry};
pub use schema::{FixtureSchema, ID_FIELD, Record};
