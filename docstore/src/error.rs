//! Error types for the store boundary and the repository surface.
//!
//! Store backends report [`StoreError`]; the repository maps those into
//! [`RepositoryError`] for callers.

use thiserror::Error;

/// Outcome of a single store operation, as reported by a store client
/// or provider.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The target document or collection does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A document with the same identifier is already stored.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Any other backend failure, carried with its original detail.
    #[error("Backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

/// Errors surfaced by repository operations.
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// The requested entity (or its collection) does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An entity with the generated identifier already exists.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// An entity could not be converted to or from a document.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A store failure with no more specific repository meaning.
    #[error("Store error: {0}")]
    Store(#[source] StoreError),
}

/// Convenience alias for repository results.
pub type Result<T> = std::result::Result<T, RepositoryError>;
