//! Great-circle distance and nearest-station ranking.
//!
//! Everything here is pure: no I/O, no clocks, no shared state.

mod distance;
mod rank;

pub use distance::{EARTH_RADIUS_KM, haversine_km};
pub use rank::{RankError, nearest, rank_stations};
