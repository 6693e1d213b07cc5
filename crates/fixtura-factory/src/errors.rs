use thiserror::Error;

use fixtura_generate::GenerationError;
use fixtura_store::StoreError;

pub type Result<T> = std::result::Result<T, FactoryError>;

/// Errors surfaced by factory operations.
#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("fixture '{0}' is not registered and no fallback schema was given")]
    NotFound(String),
    #[error(transparent)]
    Generation(GenerationError),
    #[error(transparent)]
    Persistence(#[from] StoreError),
    #[error(transparent)]
    Core(#[from] fixtura_core::Error),
    #[error("ledger lock poisoned")]
    Poisoned,
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

impl From<GenerationError> for FactoryError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Configuration(message) => FactoryError::Configuration(message),
            other => FactoryError::Generation(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use fixtura_generate::FakerError;

    use super::*;

    #[test]
    fn generator_configuration_errors_are_caller_errors() {
        let err = FactoryError::from(GenerationError::Configuration("empty".to_string()));
        assert!(matches!(err, FactoryError::Configuration(message) if message == "empty"));

        let err = FactoryError::from(GenerationError::References {
            source: FakerError::UnresolvedRef("tag".to_string()),
        });
        assert!(matches!(err, FactoryError::Generation(_)));
    }
}
