//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::domain::{RankedStation, Station};
use crate::lookup::NearbyStations;

use super::directions::directions_url;

/// Query for the closest stations.
///
/// Both fields are optional here so that a missing one can be reported
/// as a JSON error rather than a bare rejection.
#[derive(Debug, Deserialize)]
pub struct ClosestStationsRequest {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// A station in the directory listing.
#[derive(Debug, Serialize)]
pub struct StationResult {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl From<&Station> for StationResult {
    fn from(station: &Station) -> Self {
        Self {
            id: station.id().to_string(),
            name: station.name().to_string(),
            lat: station.coordinate().latitude(),
            lon: station.coordinate().longitude(),
        }
    }
}

/// Response listing every known station.
#[derive(Debug, Serialize)]
pub struct StationListResponse {
    pub stations: Vec<StationResult>,
}

/// A ranked station as shown to the user.
#[derive(Debug, Serialize)]
pub struct ClosestStationResult {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,

    /// Distance in kilometers, if known
    pub distance_km: Option<f64>,

    /// Display distance, e.g. "6.72 km" or "unknown"
    pub distance: String,

    /// Travel time in minutes, if known
    pub travel_time_min: Option<f64>,

    /// Display travel time, e.g. "12 min" or "unknown"
    pub travel_time: String,

    /// Map directions to the station
    pub directions_url: String,
}

impl From<&RankedStation> for ClosestStationResult {
    fn from(ranked: &RankedStation) -> Self {
        let station = &ranked.station;
        Self {
            id: station.id().to_string(),
            name: station.name().to_string(),
            lat: station.coordinate().latitude(),
            lon: station.coordinate().longitude(),
            distance_km: ranked.distance_km,
            distance: ranked.distance_label(),
            travel_time_min: ranked.travel_time_min,
            travel_time: ranked.travel_time_label(),
            directions_url: directions_url(station.coordinate()),
        }
    }
}

/// Response for a closest-stations query.
#[derive(Debug, Serialize)]
pub struct ClosestStationsResponse {
    /// Stations, nearest first
    pub stations: Vec<ClosestStationResult>,

    /// Whether the answer came from the cache
    pub cached: bool,
}

impl From<&NearbyStations> for ClosestStationsResponse {
    fn from(nearby: &NearbyStations) -> Self {
        Self {
            stations: nearby.stations.iter().map(ClosestStationResult::from).collect(),
            cached: nearby.is_cached(),
        }
    }
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
