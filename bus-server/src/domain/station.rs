//! Bus station types.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Coordinate;

/// Error returned when station data fails validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid station: {reason}")]
pub struct InvalidStation {
    reason: &'static str,
}

/// Opaque station identifier.
///
/// The upstream assigns these; we never interpret them.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationId(String);

impl StationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StationId({})", self.0)
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A bus station: identity plus location.
///
/// Immutable once loaded. The name is guaranteed non-blank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    id: StationId,
    name: String,
    #[serde(flatten)]
    coordinate: Coordinate,
}

impl Station {
    /// Create a station. The name is trimmed and must not be empty.
    pub fn new(
        id: StationId,
        name: impl AsRef<str>,
        coordinate: Coordinate,
    ) -> Result<Self, InvalidStation> {
        let name = name.as_ref().trim();
        if name.is_empty() {
            return Err(InvalidStation {
                reason: "name must not be empty",
            });
        }

        Ok(Self {
            id,
            name: name.to_string(),
            coordinate,
        })
    }

    pub fn id(&self) -> &StationId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }
}
