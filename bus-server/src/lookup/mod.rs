//! The "bus stations near me" lookup lifecycle.
//!
//! A [`NearbyLookup`] asks for location permission, reads the current
//! position, shows a cached ranking when one is fresh, and otherwise
//! fetches a live one with bounded retry. Newer lookups supersede older
//! ones.

mod error;
mod location;
mod retry;
mod sequencer;
mod session;
mod state;

pub use error::LookupError;
pub use location::{FixedLocation, LocationError, LocationProvider, PermissionStatus};
pub use retry::{RetryConfig, retry};
pub use sequencer::{RequestSequencer, Ticket};
pub use session::{LookupConfig, NearbyLookup};
pub use state::{LookupPhase, LookupState, NearbyStations};
