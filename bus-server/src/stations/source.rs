//! Where ranked results come from.
//!
//! Exactly one strategy is active per deployment: either we rank our own
//! station directory, or we delegate ranking (and travel-time estimates)
//! to the upstream service and trust its answer.

use std::future::Future;

use tracing::debug;

use crate::domain::{Coordinate, RankedStation};
use crate::geo::{RankError, nearest};

use super::client::StationClient;
use super::directory::StationDirectory;
use super::error::StationError;

/// Error from a station source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// No stations to rank
    #[error("no bus stations available")]
    EmptyStationSet,

    /// Transport failure or non-success status
    #[error("network error: {message}")]
    Network { message: String, retryable: bool },

    /// Upstream answered with something we cannot use
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl SourceError {
    /// Whether an automatic retry is worthwhile.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SourceError::Network {
                retryable: true,
                ..
            }
        )
    }
}

impl From<RankError> for SourceError {
    fn from(e: RankError) -> Self {
        match e {
            RankError::EmptyStationSet => SourceError::EmptyStationSet,
        }
    }
}

impl From<StationError> for SourceError {
    fn from(e: StationError) -> Self {
        let retryable = e.is_retryable();
        match e {
            StationError::Http(_) | StationError::Api { .. } => SourceError::Network {
                message: e.to_string(),
                retryable,
            },
            StationError::Malformed { message } | StationError::Fixture { message } => {
                SourceError::MalformedResponse(message)
            }
        }
    }
}

/// Produces stations ranked nearest-first for a coordinate.
pub trait StationSource: Send + Sync {
    fn nearby(
        &self,
        origin: Coordinate,
    ) -> impl Future<Output = Result<Vec<RankedStation>, SourceError>> + Send;
}

/// Ranks the local directory by haversine distance.
#[derive(Clone)]
pub struct LocalRanking {
    directory: StationDirectory,
    limit: usize,
}

impl LocalRanking {
    /// Rank `directory`, returning at most `limit` stations (0 for all).
    pub fn new(directory: StationDirectory, limit: usize) -> Self {
        Self { directory, limit }
    }
}

impl StationSource for LocalRanking {
    async fn nearby(&self, origin: Coordinate) -> Result<Vec<RankedStation>, SourceError> {
        let stations = self.directory.snapshot().await;
        let ranked = nearest(origin, &stations, self.limit)?;
        debug!(%origin, considered = stations.len(), returned = ranked.len(), "ranked locally");
        Ok(ranked)
    }
}

/// Delegates ranking to the upstream service.
#[derive(Clone)]
pub struct RemoteRanking {
    client: StationClient,
}

impl RemoteRanking {
    pub fn new(client: StationClient) -> Self {
        Self { client }
    }
}

impl StationSource for RemoteRanking {
    async fn nearby(&self, origin: Coordinate) -> Result<Vec<RankedStation>, SourceError> {
        let ranked = self.client.closest_stations(origin).await?;
        // An empty answer means "no data", not "nothing nearby".
        if ranked.is_empty() {
            return Err(SourceError::EmptyStationSet);
        }
        Ok(ranked)
    }
}

/// The strategy chosen at startup.
#[derive(Clone)]
pub enum ConfiguredSource {
    Local(LocalRanking),
    Remote(RemoteRanking),
}

impl ConfiguredSource {
    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ConfiguredSource::Local(_) => "local",
            ConfiguredSource::Remote(_) => "remote",
        }
    }
}

impl StationSource for ConfiguredSource {
    async fn nearby(&self, origin: Coordinate) -> Result<Vec<RankedStation>, SourceError> {
        match self {
            ConfiguredSource::Local(source) => source.nearby(origin).await,
            ConfiguredSource::Remote(source) => source.nearby(origin).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Station, StationId};
    use crate::stations::StationClientConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn c(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    fn station(name: &str, lat: f64, lon: f64) -> Station {
        Station::new(StationId::new(name), name, c(lat, lon)).unwrap()
    }

    #[tokio::test]
    async fn local_ranks_and_limits() {
        let directory = StationDirectory::fixed(vec![
            station("B", 32.00, 35.95),
            station("A", 31.95, 35.91),
            station("C", 32.10, 36.10),
        ]);
        let source = LocalRanking::new(directory, 2);

        let ranked = source.nearby(c(31.95, 35.91)).await.unwrap();
        let names: Vec<_> = ranked.iter().map(|r| r.station.name()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn local_empty_directory() {
        let source = ConfiguredSource::Local(LocalRanking::new(StationDirectory::fixed(vec![]), 10));
        assert_eq!(
            source.nearby(c(0.0, 0.0)).await,
            Err(SourceError::EmptyStationSet)
        );
    }

    #[tokio::test]
    async fn remote_empty_answer_is_empty_set() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/closest-stations"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .mount(&server)
            .await;

        let client = StationClient::new(StationClientConfig::new(server.uri())).unwrap();
        let source = ConfiguredSource::Remote(RemoteRanking::new(client));
        assert_eq!(source.kind(), "remote");
        assert_eq!(
            source.nearby(c(31.95, 35.91)).await,
            Err(SourceError::EmptyStationSet)
        );
    }

    #[test]
    fn station_errors_map_to_source_errors() {
        let err: SourceError = StationError::Api {
            status: 502,
            message: "bad gateway".into(),
        }
        .into();
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "network error: API error 502: bad gateway");

        let err: SourceError = StationError::Api {
            status: 400,
            message: String::new(),
        }
        .into();
        assert!(!err.is_retryable());

        let err: SourceError = StationError::Malformed {
            message: "invalid JSON".into(),
        }
        .into();
        assert_eq!(err, SourceError::MalformedResponse("invalid JSON".into()));
        assert!(!err.is_retryable());
    }
}
