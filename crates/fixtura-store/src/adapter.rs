use async_trait::async_trait;
use serde_json::Value;

use fixtura_core::Record;

use crate::errors::Result;

/// Capability the fixture factory needs from a document store.
///
/// Documents carry their identifier in the `_id` field. Implementations must
/// treat removing an unknown identifier as a successful no-op.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns the engine identifier (e.g. `memory`, `postgres`).
    fn engine(&self) -> &'static str;

    /// Whether `id` has the store's native identifier type.
    fn is_native_id(&self, id: &Value) -> bool;

    /// Mint a fresh native identifier.
    fn new_id(&self) -> Value;

    /// Insert a batch and return the stored identifiers in input order.
    async fn insert(&self, collection: &str, documents: Vec<Record>) -> Result<Vec<Value>>;

    /// Remove every document whose identifier is in `ids`.
    ///
    /// A collection that was never written holds nothing and removes 0.
    async fn remove(&self, collection: &str, ids: &[Value]) -> Result<u64>;

    /// Count the documents whose identifier is in `ids`.
    async fn count(&self, collection: &str, ids: &[Value]) -> Result<u64>;
}
