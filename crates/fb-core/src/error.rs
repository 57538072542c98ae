//! # AppError
//!
//! Centralized error handling for the Flatboard ecosystem.
//! Maps storage and submission failures to actionable error types.

use thiserror::Error;

/// The primary error type for all fb-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., a thread id that resolves to no record)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., empty title, empty body)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Attempt to persist a record without its required identity
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// The id sequence could not issue a new id
    #[error("allocation failure: {0}")]
    AllocationFailure(String),

    /// The data directory is missing or unwritable at startup
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A read or write against a record failed
    #[error("storage error: {0}")]
    Storage(String),

    /// A scoped lease could not be acquired within the configured wait
    #[error("timed out acquiring lease on {0}")]
    LeaseTimeout(String),

    /// Request rejected before reaching storage (CSRF mismatch, spam trap)
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Rate limit exceeded
    #[error("too many requests: {0}")]
    RateLimitExceeded(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// The *ThreadNotFound* outcome of the collaborator interface.
    pub fn thread_not_found(id: impl Into<String>) -> Self {
        AppError::NotFound("Thread".to_string(), id.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(..))
    }
}

/// A specialized Result type for Flatboard logic.
pub type Result<T> = std::result::Result<T, AppError>;
