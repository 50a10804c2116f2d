//! The set of known stations.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::domain::{Station, StationId};

use super::client::StationClient;
use super::error::StationError;
use super::wire::parse_station_list;

/// Where the directory loads its stations from.
#[derive(Debug, Clone)]
pub enum DirectorySource {
    /// A JSON fixture on disk.
    File(PathBuf),
    /// The upstream `/stations` endpoint.
    Remote(StationClient),
    /// A fixed in-memory list; refresh is a no-op.
    Fixed,
}

impl DirectorySource {
    async fn load(&self) -> Result<Option<Vec<Station>>, StationError> {
        match self {
            DirectorySource::File(path) => {
                let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
                    StationError::Fixture {
                        message: format!("failed to read {}: {e}", path.display()),
                    }
                })?;
                parse_station_list(&contents)
                    .map(Some)
                    .map_err(|e| StationError::Fixture {
                        message: format!("{}: {e}", path.display()),
                    })
            }
            DirectorySource::Remote(client) => client.fetch_all().await.map(Some),
            DirectorySource::Fixed => Ok(None),
        }
    }
}

/// Thread-safe station directory.
///
/// Holds station-identity data (names and locations), which changes
/// rarely. Supports background refresh; readers always see a complete
/// list, either the old one or the new one.
#[derive(Clone)]
pub struct StationDirectory {
    inner: Arc<RwLock<Arc<Vec<Station>>>>,
    source: Arc<DirectorySource>,
}

impl StationDirectory {
    /// Load the directory from `source`.
    ///
    /// This will fail if the source is unreadable.
    pub async fn load(source: DirectorySource) -> Result<Self, StationError> {
        let stations = source.load().await?.unwrap_or_default();
        info!(count = stations.len(), "loaded station directory");

        Ok(Self {
            inner: Arc::new(RwLock::new(Arc::new(stations))),
            source: Arc::new(source),
        })
    }

    /// Create a directory over a fixed list.
    pub fn fixed(stations: Vec<Station>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(stations))),
            source: Arc::new(DirectorySource::Fixed),
        }
    }

    /// The current station list.
    pub async fn snapshot(&self) -> Arc<Vec<Station>> {
        let guard = self.inner.read().await;
        (*guard).clone()
    }

    /// Look up a station by id.
    pub async fn get(&self, id: &StationId) -> Option<Station> {
        let guard = self.inner.read().await;
        guard.iter().find(|s| s.id() == id).cloned()
    }

    /// Get the number of stations.
    pub async fn len(&self) -> usize {
        let guard = self.inner.read().await;
        guard.len()
    }

    /// Reload from the source.
    ///
    /// On success, replaces the current list. On failure, the existing
    /// list is preserved and the error is returned.
    pub async fn refresh(&self) -> Result<usize, StationError> {
        let Some(stations) = self.source.load().await? else {
            return Ok(self.len().await);
        };
        let count = stations.len();

        let mut guard = self.inner.write().await;
        *guard = Arc::new(stations);

        Ok(count)
    }
}
