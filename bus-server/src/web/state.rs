//! Application state for the web layer.

use std::sync::Arc;

use crate::cache::RankingCache;
use crate::lookup::LookupConfig;
use crate::stations::{ConfiguredSource, StationDirectory};

/// Shared application state.
///
/// Contains all the services needed to handle requests.
#[derive(Clone)]
pub struct AppState {
    /// Known stations
    pub directory: StationDirectory,

    /// The ranking strategy chosen at startup
    pub source: Arc<ConfiguredSource>,

    /// Ranked results by quantized coordinate
    pub cache: RankingCache,

    /// Settings for each request's lookup
    pub lookup: LookupConfig,
}

impl AppState {
    /// Create a new app state.
    pub fn new(
        directory: StationDirectory,
        source: ConfiguredSource,
        cache: RankingCache,
        lookup: LookupConfig,
    ) -> Self {
        Self {
            directory,
            source: Arc::new(source),
            cache,
            lookup,
        }
    }
}
