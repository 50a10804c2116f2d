//! Nearest-first station ranking.

use std::cmp::Ordering;

use crate::domain::{Coordinate, RankedStation, Station};

use super::haversine_km;

/// Error from ranking.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RankError {
    /// There were no stations to rank.
    #[error("no bus stations available")]
    EmptyStationSet,
}

/// Rank stations by distance from `origin`, nearest first.
///
/// Each station is annotated with its haversine distance. Stations at
/// equal distance keep their input order.
///
/// # Errors
///
/// Returns `RankError::EmptyStationSet` when `stations` is empty, so
/// callers can tell "no data" apart from "no results".
pub fn rank_stations(
    origin: Coordinate,
    stations: &[Station],
) -> Result<Vec<RankedStation>, RankError> {
    if stations.is_empty() {
        return Err(RankError::EmptyStationSet);
    }

    let mut ranked: Vec<RankedStation> = stations
        .iter()
        .map(|s| RankedStation::with_distance(s.clone(), haversine_km(origin, s.coordinate())))
        .collect();

    // `sort_by` is stable. Distances are always finite for valid coordinates.
    ranked.sort_by(|a, b| {
        a.distance_km
            .partial_cmp(&b.distance_km)
            .unwrap_or(Ordering::Equal)
    });

    Ok(ranked)
}

/// Rank stations and keep the `limit` nearest. A limit of 0 keeps all.
pub fn nearest(
    origin: Coordinate,
    stations: &[Station],
    limit: usize,
) -> Result<Vec<RankedStation>, RankError> {
    let mut ranked = rank_stations(origin, stations)?;
    if limit > 0 {
        ranked.truncate(limit);
    }
    Ok(ranked)
}
