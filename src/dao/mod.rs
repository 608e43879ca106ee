//! Persistence collaborators. Sessions themselves are never persisted; only
//! finished-match reports and their account linkage go through these seams.

pub mod accounts;
pub mod reports;

use thiserror::Error;

/// Errors surfaced by a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend refused or failed the operation.
    #[error("store failure: {0}")]
    Backend(String),
}

/// Convenience alias for store results.
pub type StoreResult<T> = Result<T, StoreError>;
