use common::Version;
use thiserror::Error;

/// Errors that can occur when loading or persisting aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No aggregate with this identity exists in the store or the session.
    #[error("{aggregate_type} not found: {id}")]
    NotFound {
        aggregate_type: &'static str,
        id: String,
    },

    /// The aggregate was written by another session after it was read here.
    #[error(
        "Concurrency conflict for {aggregate_type} {id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        aggregate_type: &'static str,
        id: String,
        expected: Version,
        actual: Version,
    },
}

impl StoreError {
    pub fn not_found<A: domain::Aggregate>(id: &A::Id) -> Self {
        StoreError::NotFound {
            aggregate_type: A::aggregate_type(),
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
