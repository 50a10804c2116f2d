//! Stations annotated with distance and travel time.

use serde::{Deserialize, Serialize};

use super::Station;

/// Text shown when a distance or travel time is not known.
pub const UNKNOWN: &str = "unknown";

/// A station with its distance from a query point.
///
/// Locally ranked stations always have a distance. Stations ranked by the
/// remote service may lack either field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedStation {
    pub station: Station,

    /// Great-circle distance in kilometers.
    pub distance_km: Option<f64>,

    /// Estimated travel time in minutes, supplied by the routing source.
    pub travel_time_min: Option<f64>,
}

impl RankedStation {
    /// A locally ranked station with a computed distance.
    pub fn with_distance(station: Station, distance_km: f64) -> Self {
        Self {
            station,
            distance_km: Some(distance_km),
            travel_time_min: None,
        }
    }

    /// Build from untrusted upstream values.
    ///
    /// Negative or non-finite numbers are dropped to `None`.
    pub fn from_upstream(
        station: Station,
        distance_km: Option<f64>,
        travel_time_min: Option<f64>,
    ) -> Self {
        Self {
            station,
            distance_km: distance_km.filter(|d| is_sane(*d)),
            travel_time_min: travel_time_min.filter(|t| is_sane(*t)),
        }
    }

    /// Distance for display, e.g. `"6.72 km"`.
    pub fn distance_label(&self) -> String {
        format_distance(self.distance_km)
    }

    /// Travel time for display, e.g. `"12 min"`.
    pub fn travel_time_label(&self) -> String {
        format_travel_time(self.travel_time_min)
    }
}

fn is_sane(v: f64) -> bool {
    v.is_finite() && v >= 0.0
}

/// Format a distance with two decimals.
pub fn format_distance(distance_km: Option<f64>) -> String {
    match distance_km {
        Some(d) => format!("{d:.2} km"),
        None => UNKNOWN.to_string(),
    }
}

/// Format a travel time rounded to whole minutes.
pub fn format_travel_time(minutes: Option<f64>) -> String {
    match minutes {
        Some(m) => format!("{:.0} min", m.round()),
        None => UNKNOWN.to_string(),
    }
}
