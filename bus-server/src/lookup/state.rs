//! Lookup lifecycle states.
//!
//! ```text
//! idle -> requesting-permission -> locating -> cache-hit-displaying -> success | error
//!                                          \-> fetching ------------/
//! ```
//!
//! `success` and `error` end a lookup. A new refresh re-enters at
//! `locating`, or at `requesting-permission` when permission is missing.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::{Coordinate, RankedStation};

use super::error::LookupError;

/// Stations found for one lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyStations {
    /// Where the user was.
    pub origin: Coordinate,

    /// Stations, nearest first.
    pub stations: Vec<RankedStation>,

    /// When the stations came from the cache, the time they were stored.
    pub cached_at: Option<DateTime<Utc>>,
}

impl NearbyStations {
    pub fn is_cached(&self) -> bool {
        self.cached_at.is_some()
    }
}

/// Observable state of a lookup.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LookupState {
    #[default]
    Idle,
    RequestingPermission,
    Locating,
    /// Cached stations are shown while a refresh may be in flight.
    CacheHitDisplaying(Arc<NearbyStations>),
    Fetching,
    Success(Arc<NearbyStations>),
    Error(LookupError),
}

/// Data-free view of `LookupState`, for transition checks and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupPhase {
    Idle,
    RequestingPermission,
    Locating,
    CacheHitDisplaying,
    Fetching,
    Success,
    Error,
}

impl LookupState {
    pub fn phase(&self) -> LookupPhase {
        match self {
            LookupState::Idle => LookupPhase::Idle,
            LookupState::RequestingPermission => LookupPhase::RequestingPermission,
            LookupState::Locating => LookupPhase::Locating,
            LookupState::CacheHitDisplaying(_) => LookupPhase::CacheHitDisplaying,
            LookupState::Fetching => LookupPhase::Fetching,
            LookupState::Success(_) => LookupPhase::Success,
            LookupState::Error(_) => LookupPhase::Error,
        }
    }

    /// Stations currently on display, if any.
    pub fn stations(&self) -> Option<&Arc<NearbyStations>> {
        match self {
            LookupState::CacheHitDisplaying(s) | LookupState::Success(s) => Some(s),
            _ => None,
        }
    }
}

impl LookupPhase {
    /// `success` and `error` end a lookup.
    pub fn is_terminal(self) -> bool {
        matches!(self, LookupPhase::Success | LookupPhase::Error)
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    pub fn allows(self, next: LookupPhase) -> bool {
        use LookupPhase::*;

        match (self, next) {
            (Idle, RequestingPermission) => true,
            (Idle, _) => false,
            // A new refresh may start from anywhere once running.
            (_, RequestingPermission | Locating) => true,
            (RequestingPermission, Error) => true,
            (Locating, CacheHitDisplaying | Fetching | Error) => true,
            (CacheHitDisplaying | Fetching, Success | Error) => true,
            _ => false,
        }
    }
}
