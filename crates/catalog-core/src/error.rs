//! Error types for the catalog repository

use catalog_types::ProductId;
use thiserror::Error;

pub type CatalogResult<T> = std::result::Result<T, CatalogError>;
pub type StoreResult<T> = std::result::Result<T, StoreError>;
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Failures reported by the durable store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Product not found: {id}")]
    NotFound { id: ProductId },

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Store connection error: {0}")]
    Connection(String),

    #[error("Store error: {0}")]
    Backend(String),
}

/// Failures reported by the fast cache. A miss is never an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    Connection(String),

    #[error("Cache protocol error: {0}")]
    Protocol(String),
}

/// A record could not be moved to or from its cached representation.
#[derive(Error, Debug)]
#[error("Serialization error: {0}")]
pub struct SerializationError(#[from] serde_json::Error);

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Operation deadline exceeded")]
    DeadlineExceeded,
}

impl CatalogError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::Store(StoreError::NotFound { .. }))
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        CatalogError::Serialization(SerializationError(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        let err: CatalogError = StoreError::NotFound { id: 3 }.into();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Product not found: 3");

        let err: CatalogError = CacheError::Connection("refused".into()).into();
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "Cache connection error: refused");
    }

    #[test]
    fn test_serde_error_becomes_serialization_error() {
        let bad = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: CatalogError = bad.into();
        assert!(matches!(err, CatalogError::Serialization(_)));
    }
}
