use std::path::PathBuf;

use thiserror::Error;

/// Core error type shared across fixtura crates.
#[derive(Debug, Error)]
pub enum Error {
    /// The configuration document is malformed or incomplete.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// A fixture source does not have the expected shape.
    #[error("invalid fixture schema: {0}")]
    InvalidSchema(String),
    /// Reading a fixture source or config file failed.
    #[error("io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("toml decode error: {0}")]
    TomlDecode(#[from] toml::de::Error),
}

/// Convenience alias for results returned by fixtura crates.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
