//! Station data: the local directory, the upstream client, and the
//! ranking strategies built on them.

mod client;
mod directory;
mod error;
mod source;
mod wire;

pub use client::{StationClient, StationClientConfig};
pub use directory::{DirectorySource, StationDirectory};
pub use error::StationError;
pub use source::{ConfiguredSource, LocalRanking, RemoteRanking, SourceError, StationSource};
pub use wire::{parse_ranked_list, parse_station_list};
