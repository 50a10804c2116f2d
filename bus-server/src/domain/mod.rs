//! Domain types for nearby-station lookup.
//!
//! This module contains the core types that represent validated
//! location and station data. All types enforce their invariants at
//! construction time, so code that receives these types can trust their
//! validity.

mod coordinate;
mod ranked;
mod station;

pub use coordinate::{Coordinate, InvalidCoordinate, QuantizedCoordinate};
pub use ranked::{RankedStation, UNKNOWN, format_distance, format_travel_time};
pub use station::{InvalidStation, Station, StationId};

/// Prefix shared by every ranking-cache key in the store.
pub const CACHE_KEY_PREFIX: &str = "closest:";
