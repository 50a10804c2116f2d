//! HTTP client for the upstream station service.

use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};
use tracing::debug;

use crate::domain::{Coordinate, RankedStation, Station};

use super::error::StationError;
use super::wire::{parse_ranked_list, parse_station_list};

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// How much of an error body to keep in messages.
const ERROR_BODY_LIMIT: usize = 500;

/// Configuration for the station service client.
#[derive(Debug, Clone)]
pub struct StationClientConfig {
    /// Base URL of the upstream, e.g. `https://buses.example.org/busStation`
    pub base_url: String,
    /// Optional API key sent as the `x-apikey` header
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl StationClientConfig {
    /// Create a new config for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Authenticate with an API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Client for the upstream station service.
#[derive(Debug, Clone)]
pub struct StationClient {
    http: reqwest::Client,
    base_url: String,
}

impl StationClient {
    /// Create a new station service client.
    pub fn new(config: StationClientConfig) -> Result<Self, StationError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(key).map_err(|_| StationError::Api {
                status: 0,
                message: "Invalid API key format".to_string(),
            })?;
            headers.insert(HeaderName::from_static("x-apikey"), value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The base URL requests are made against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Ask the upstream for stations ranked by distance from `origin`.
    ///
    /// The upstream's ordering and numbers are trusted as-is.
    pub async fn closest_stations(
        &self,
        origin: Coordinate,
    ) -> Result<Vec<RankedStation>, StationError> {
        let url = format!("{}/closest-stations", self.base_url);
        let body = self
            .get_text(
                &url,
                &[
                    ("lat", origin.latitude().to_string()),
                    ("lon", origin.longitude().to_string()),
                ],
            )
            .await?;

        let ranked = parse_ranked_list(&body)?;
        debug!(%origin, count = ranked.len(), "fetched closest stations");
        Ok(ranked)
    }

    /// Fetch every station the upstream knows about.
    pub async fn fetch_all(&self) -> Result<Vec<Station>, StationError> {
        let url = format!("{}/stations", self.base_url);
        let body = self.get_text(&url, &[]).await?;
        parse_station_list(&body)
    }

    async fn get_text(&self, url: &str, query: &[(&str, String)]) -> Result<String, StationError> {
        let response = self.http.get(url).query(query).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StationError::Api {
                status: status.as_u16(),
                message: body.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }

        Ok(response.text().await?)
    }
}
