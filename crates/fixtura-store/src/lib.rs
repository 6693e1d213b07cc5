//! Document store adapters used to persist generated fixtures.

pub mod adapter;
pub mod errors;
pub mod memory;
pub mod postgres;

pub use adapter::DocumentStore;
pub use errors::{Result, StoreError};
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
