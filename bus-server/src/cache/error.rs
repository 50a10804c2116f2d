//! Cache error types.

/// No fresh entry exists for the requested location.
///
/// Internal control flow only; callers fall through to a live fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cache miss")]
pub struct CacheMiss;

/// Errors from the backing key/value store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The durable database failed
    #[error("store database error: {0}")]
    Database(#[from] sled::Error),

    /// Store contents could not be encoded or decoded
    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
