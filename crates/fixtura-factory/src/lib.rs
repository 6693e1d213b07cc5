//! Fixture factory: creates schema-driven records in a document store and
//! remembers what it created so tests can clean up after themselves.

pub mod errors;
pub mod factory;
pub mod ledger;
pub mod logging;
pub mod recipe;

pub use errors::{FactoryError, Result};
pub use factory::FixtureFactory;
pub use ledger::Ledger;
pub use logging::init_logging;
pub use recipe::FixtureRecipe;

pub use fixtura_core::{FactoryConfig, FixtureSchema, ID_FIELD, Record, SchemaRegistry};
pub use fixtura_generate::{ExternalRefs, ModelGenerator, Overrides};
pub use fixtura_store::{DocumentStore, MemoryStore, PostgresStore};
