//! Map directions deep links.
//!
//! We never follow these ourselves; the client opens them in whatever
//! maps application handles the URL.

use crate::domain::Coordinate;

const DIRECTIONS_BASE: &str = "https://www.google.com/maps/dir/?api=1";

/// Generate a directions URL from the user's position to `destination`.
///
/// # Example
///
/// ```ignore
/// let url = directions_url(Coordinate::new(31.9617, 35.9097)?);
/// // Returns: "https://www.google.com/maps/dir/?api=1&destination=31.9617,35.9097"
/// ```
pub fn directions_url(destination: Coordinate) -> String {
    format!("{DIRECTIONS_BASE}&destination={destination}")
}
