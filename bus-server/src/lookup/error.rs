//! Lookup error types.

use crate::stations::SourceError;

use super::location::LocationError;

/// Why a lookup did not produce stations.
///
/// Every variant except `Superseded` is meant to be shown to the user
/// together with a way to try again.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("location permission is required to find nearby stations")]
    PermissionDenied,

    #[error("current location unavailable: {0}")]
    LocationUnavailable(String),

    #[error("could not reach the station service: {0}")]
    NetworkError(String),

    #[error("no bus stations available")]
    EmptyStationSet,

    #[error("unexpected response from the station service: {0}")]
    MalformedResponse(String),

    /// A newer lookup started before this one finished.
    #[error("superseded by a newer lookup")]
    Superseded,
}

impl LookupError {
    /// Whether this error should be shown to the user.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, LookupError::Superseded)
    }

    /// Whether retrying means asking for permission again.
    pub fn needs_permission(&self) -> bool {
        matches!(self, LookupError::PermissionDenied)
    }
}

impl From<LocationError> for LookupError {
    fn from(e: LocationError) -> Self {
        match e {
            LocationError::PermissionDenied => LookupError::PermissionDenied,
            LocationError::Unavailable(msg) => LookupError::LocationUnavailable(msg),
        }
    }
}

impl From<SourceError> for LookupError {
    fn from(e: SourceError) -> Self {
        match e {
            SourceError::EmptyStationSet => LookupError::EmptyStationSet,
            SourceError::Network { message, .. } => LookupError::NetworkError(message),
            SourceError::MalformedResponse(msg) => LookupError::MalformedResponse(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(
            LookupError::PermissionDenied.to_string(),
            "location permission is required to find nearby stations"
        );
        assert_eq!(
            LookupError::EmptyStationSet.to_string(),
            "no bus stations available"
        );
        assert_eq!(
            LookupError::NetworkError("API error 503: down".into()).to_string(),
            "could not reach the station service: API error 503: down"
        );
    }

    #[test]
    fn conversions() {
        assert_eq!(
            LookupError::from(LocationError::Unavailable("no GPS fix".into())),
            LookupError::LocationUnavailable("no GPS fix".into())
        );
        assert_eq!(
            LookupError::from(SourceError::Network {
                message: "timed out".into(),
                retryable: true,
            }),
            LookupError::NetworkError("timed out".into())
        );
        assert_eq!(
            LookupError::from(SourceError::EmptyStationSet),
            LookupError::EmptyStationSet
        );
    }

    #[test]
    fn visibility() {
        assert!(!LookupError::Superseded.is_user_visible());
        assert!(LookupError::EmptyStationSet.is_user_visible());
        assert!(LookupError::PermissionDenied.needs_permission());
        assert!(!LookupError::NetworkError(String::new()).needs_permission());
    }
}
