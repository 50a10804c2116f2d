//! Station data error types.

/// Errors that can occur when loading or fetching station data.
#[derive(Debug, thiserror::Error)]
pub enum StationError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream returned a non-success status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Response body was not a station list we understand
    #[error("malformed response: {message}")]
    Malformed { message: String },

    /// Local station fixture could not be read
    #[error("station fixture error: {message}")]
    Fixture { message: String },
}

impl StationError {
    /// Whether retrying the same request might succeed.
    ///
    /// Transport failures, 5xx and 429 are worth another attempt; other
    /// client errors and bad payloads are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            StationError::Http(_) => true,
            StationError::Api { status, .. } => *status >= 500 || *status == 429,
            StationError::Malformed { .. } | StationError::Fixture { .. } => false,
        }
    }
}
