use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Failures reported by a document store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid collection name '{0}'")]
    InvalidCollection(String),
    #[error("'{id}' is not a valid identifier for this store")]
    InvalidId { id: String },
    #[error("collection '{collection}' already holds a document with id '{id}'")]
    DuplicateId { collection: String, id: String },
    #[error("store state lock poisoned")]
    Poisoned,
    #[error("database error: {0}")]
    Db(String),
    #[error(transparent)]
    Config(#[from] fixtura_core::Error),
}
