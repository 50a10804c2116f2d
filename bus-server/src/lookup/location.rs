//! Device location seam.

use std::future::Future;

use crate::domain::Coordinate;

/// Outcome of a permission prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Errors from the location service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    /// Permission was revoked after being granted
    #[error("location permission denied")]
    PermissionDenied,

    /// No fix could be obtained
    #[error("location unavailable: {0}")]
    Unavailable(String),
}

/// Something that can tell us where the user is.
///
/// Both calls may suspend for as long as the platform takes; the lookup
/// imposes no timeout of its own.
pub trait LocationProvider: Send + Sync {
    /// Ask the user for permission to read their location.
    fn request_permission(&self) -> impl Future<Output = PermissionStatus> + Send;

    /// Take a single high-accuracy reading.
    fn current_position(&self) -> impl Future<Output = Result<Coordinate, LocationError>> + Send;
}

/// A location already known to the caller, e.g. sent with an HTTP request.
///
/// Permission is implicitly granted.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(Coordinate);

impl FixedLocation {
    pub fn new(coordinate: Coordinate) -> Self {
        Self(coordinate)
    }
}

impl LocationProvider for FixedLocation {
    async fn request_permission(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }

    async fn current_position(&self) -> Result<Coordinate, LocationError> {
        Ok(self.0)
    }
}
