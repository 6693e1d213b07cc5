use thiserror::Error;

/// Failures raised while faking a single value from a schema.
#[derive(Debug, Error)]
pub enum FakerError {
    #[error("reference at index {index} is not a valid schema")]
    InvalidReference { index: usize },
    #[error("unresolved reference '{0}'")]
    UnresolvedRef(String),
    #[error("schema nesting exceeds max depth {0}")]
    DepthExceeded(usize),
    #[error("unsupported schema: {0}")]
    UnsupportedSchema(String),
    #[error("unknown faker id '{0}'")]
    UnknownFaker(String),
    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
    #[error("unsatisfiable constraint: {0}")]
    Unsatisfiable(String),
}

/// Errors emitted by the model generator.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error(
        "there was a problem with the references array, make sure it contains valid schemas: {source}"
    )]
    References {
        #[source]
        source: FakerError,
    },
    #[error("fixture schema produced {kind} instead of an object")]
    NotAnObject { kind: &'static str },
}
