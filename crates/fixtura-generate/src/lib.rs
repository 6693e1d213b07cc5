//! Schema-driven record generation for fixtura.
//!
//! [`SchemaFaker`] produces one sample object from a fixture schema;
//! [`ModelGenerator`] drives it to a finite, lazily evaluated run of records
//! with caller overrides merged in.

pub mod engine;
pub mod errors;
pub mod faker;
pub mod model;

pub use engine::{ModelGenerator, ModelRun, hash_seed};
pub use errors::{FakerError, GenerationError};
pub use faker::{FakerOptions, RecordGenerator, SchemaFaker};
pub use model::{ExternalRefs, Overrides};
