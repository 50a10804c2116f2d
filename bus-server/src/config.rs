//! Service configuration from environment variables.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::lookup::{LookupConfig, RetryConfig};
use crate::stations::{DirectorySource, StationClient, StationClientConfig};

/// Finest quantization we accept; beyond this keys stop grouping nearby
/// points at all.
const MAX_PRECISION: u32 = 9;

/// Error in the service configuration.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {key}={value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{key} must be set when BUS_SOURCE=remote")]
    Missing { key: &'static str },
}

/// Which strategy ranks stations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMode {
    /// Haversine over the local directory.
    Local,
    /// Delegate to the upstream service.
    Remote,
}

impl FromStr for SourceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(SourceMode::Local),
            "remote" => Ok(SourceMode::Remote),
            _ => Err("expected `local` or `remote`".to_string()),
        }
    }
}

impl fmt::Display for SourceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SourceMode::Local => "local",
            SourceMode::Remote => "remote",
        })
    }
}

/// Everything the binary needs to start.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on.
    pub bind_addr: SocketAddr,

    /// Ranking strategy.
    pub source: SourceMode,

    /// Base URL of the upstream station service.
    /// Required in remote mode, where it also feeds the directory.
    pub upstream_url: Option<String>,

    /// Optional API key for the upstream.
    pub upstream_api_key: Option<String>,

    /// Station fixture used in local mode.
    pub stations_file: PathBuf,

    /// Durable cache database directory. The cache lives in memory when unset.
    pub cache_path: Option<PathBuf>,

    /// Decimal places kept when bucketing coordinates for the cache.
    pub cache_precision: u32,

    /// How long ranked results stay valid.
    /// Travel times drift, so this is short.
    pub routing_ttl: Duration,

    /// How often station-identity data is reloaded.
    pub station_ttl: Duration,

    /// Most stations returned by local ranking (0 for all).
    pub result_limit: usize,

    /// Upstream request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Automatic retries for transient network errors.
    pub max_retries: usize,

    /// Refresh a cached answer in the background after serving it.
    pub refresh_on_hit: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            source: SourceMode::Local,
            upstream_url: None,
            upstream_api_key: None,
            stations_file: PathBuf::from("data/stations.json"),
            cache_path: None,
            cache_precision: 3,
            routing_ttl: Duration::from_secs(15 * 60),
            station_ttl: Duration::from_secs(24 * 60 * 60),
            result_limit: 10,
            request_timeout_secs: 10,
            max_retries: 2,
            refresh_on_hit: false,
        }
    }
}

impl ServiceConfig {
    /// Read the configuration from `BUS_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`, which maps a variable
    /// name to its value. Unset and blank variables take the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let config = Self {
            bind_addr: parse_or(&get, "BUS_BIND_ADDR", defaults.bind_addr)?,
            source: parse_or(&get, "BUS_SOURCE", defaults.source)?,
            upstream_url: get("BUS_UPSTREAM_URL"),
            upstream_api_key: get("BUS_UPSTREAM_API_KEY"),
            stations_file: get("BUS_STATIONS_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.stations_file),
            cache_path: get("BUS_CACHE_PATH").map(PathBuf::from),
            cache_precision: parse_or(&get, "BUS_CACHE_PRECISION", defaults.cache_precision)?,
            routing_ttl: parse_secs_or(&get, "BUS_ROUTING_TTL_SECS", defaults.routing_ttl)?,
            station_ttl: parse_secs_or(&get, "BUS_STATION_TTL_SECS", defaults.station_ttl)?,
            result_limit: parse_or(&get, "BUS_RESULT_LIMIT", defaults.result_limit)?,
            request_timeout_secs: parse_or(
                &get,
                "BUS_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout_secs,
            )?,
            max_retries: parse_or(&get, "BUS_MAX_RETRIES", defaults.max_retries)?,
            refresh_on_hit: parse_or(&get, "BUS_REFRESH_ON_HIT", defaults.refresh_on_hit)?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_precision > MAX_PRECISION {
            return Err(ConfigError::Invalid {
                key: "BUS_CACHE_PRECISION",
                value: self.cache_precision.to_string(),
                reason: format!("must be at most {MAX_PRECISION}"),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "BUS_REQUEST_TIMEOUT_SECS",
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if self.source == SourceMode::Remote && self.upstream_url.is_none() {
            return Err(ConfigError::Missing {
                key: "BUS_UPSTREAM_URL",
            });
        }
        Ok(())
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            ttl: self.routing_ttl,
            precision: self.cache_precision,
        }
    }

    pub fn lookup_config(&self) -> LookupConfig {
        LookupConfig {
            refresh_on_hit: self.refresh_on_hit,
            retry: RetryConfig::new(self.max_retries),
        }
    }

    /// Client settings for the upstream, if one is configured.
    pub fn client_config(&self) -> Option<StationClientConfig> {
        let url = self.upstream_url.as_ref()?;
        let mut config = StationClientConfig::new(url).with_timeout(self.request_timeout_secs);
        if let Some(key) = &self.upstream_api_key {
            config = config.with_api_key(key);
        }
        Some(config)
    }

    /// Where the station directory loads from, given a built client in
    /// remote mode.
    pub fn directory_source(
        &self,
        client: Option<StationClient>,
    ) -> Result<DirectorySource, ConfigError> {
        match (self.source, client) {
            (SourceMode::Local, _) => Ok(DirectorySource::File(self.stations_file.clone())),
            (SourceMode::Remote, Some(client)) => Ok(DirectorySource::Remote(client)),
            (SourceMode::Remote, None) => Err(ConfigError::Missing {
                key: "BUS_UPSTREAM_URL",
            }),
        }
    }
}

fn parse_or<T>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

/// Parse a positive number of seconds. Zero is rejected: every cached
/// item must eventually expire and be refreshed.
fn parse_secs_or(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    let secs: u64 = parse_or(get, key, default.as_secs())?;
    if secs == 0 {
        return Err(ConfigError::Invalid {
            key,
            value: "0".to_string(),
            reason: "must be positive".to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_vars(vars: &[(&str, &str)]) -> Result<ServiceConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = from_vars(&[]).unwrap();

        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:3000");
        assert_eq!(config.source, SourceMode::Local);
        assert_eq!(config.stations_file, PathBuf::from("data/stations.json"));
        assert_eq!(config.cache_path, None);
        assert_eq!(config.cache_precision, 3);
        assert_eq!(config.routing_ttl, Duration::from_secs(900));
        assert_eq!(config.station_ttl, Duration::from_secs(86_400));
        assert_eq!(config.result_limit, 10);
        assert_eq!(config.max_retries, 2);
        assert!(!config.refresh_on_hit);
        assert!(config.client_config().is_none());
    }

    #[test]
    fn station_data_outlives_routing_data() {
        let config = ServiceConfig::default();
        assert!(config.station_ttl > config.routing_ttl);
    }

    #[test]
    fn overrides() {
        let config = from_vars(&[
            ("BUS_BIND_ADDR", "0.0.0.0:8080"),
            ("BUS_SOURCE", "Remote"),
            ("BUS_UPSTREAM_URL", "http://upstream:3000"),
            ("BUS_UPSTREAM_API_KEY", "secret"),
            ("BUS_CACHE_PATH", "/var/cache/bus"),
            ("BUS_CACHE_PRECISION", "4"),
            ("BUS_ROUTING_TTL_SECS", "60"),
            ("BUS_RESULT_LIMIT", "0"),
            ("BUS_REQUEST_TIMEOUT_SECS", "3"),
            ("BUS_MAX_RETRIES", "0"),
            ("BUS_REFRESH_ON_HIT", "true"),
        ])
        .unwrap();

        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.source, SourceMode::Remote);
        assert_eq!(config.cache_path, Some(PathBuf::from("/var/cache/bus")));
        assert_eq!(config.cache_config().precision, 4);
        assert_eq!(config.cache_config().ttl, Duration::from_secs(60));
        assert_eq!(config.result_limit, 0);
        assert!(config.lookup_config().refresh_on_hit);
        assert_eq!(config.lookup_config().retry.max_retries, 0);

        let client = config.client_config().unwrap();
        assert_eq!(client.base_url, "http://upstream:3000");
        assert_eq!(client.api_key.as_deref(), Some("secret"));
        assert_eq!(client.timeout_secs, 3);
    }

    #[test]
    fn blank_values_take_defaults() {
        let config = from_vars(&[("BUS_CACHE_PRECISION", "  "), ("BUS_SOURCE", "")]).unwrap();
        assert_eq!(config.cache_precision, 3);
        assert_eq!(config.source, SourceMode::Local);
    }

    #[test]
    fn invalid_values() {
        let err = from_vars(&[("BUS_CACHE_PRECISION", "three")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "BUS_CACHE_PRECISION",
                ..
            }
        ));

        assert!(from_vars(&[("BUS_CACHE_PRECISION", "12")]).is_err());
        assert!(from_vars(&[("BUS_SOURCE", "cloud")]).is_err());
        assert!(from_vars(&[("BUS_BIND_ADDR", "localhost")]).is_err());
        assert!(from_vars(&[("BUS_MAX_RETRIES", "-1")]).is_err());
        assert!(from_vars(&[("BUS_REQUEST_TIMEOUT_SECS", "0")]).is_err());
    }

    #[test]
    fn ttls_must_be_positive() {
        let err = from_vars(&[("BUS_ROUTING_TTL_SECS", "0")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "BUS_ROUTING_TTL_SECS",
                value: "0".into(),
                reason: "must be positive".into(),
            }
        );
        assert!(from_vars(&[("BUS_STATION_TTL_SECS", "0")]).is_err());
    }

    #[test]
    fn remote_needs_upstream() {
        assert_eq!(
            from_vars(&[("BUS_SOURCE", "remote")]).unwrap_err(),
            ConfigError::Missing {
                key: "BUS_UPSTREAM_URL"
            }
        );
    }

    #[test]
    fn directory_source_follows_mode() {
        let local = ServiceConfig::default();
        assert!(matches!(
            local.directory_source(None),
            Ok(DirectorySource::File(_))
        ));

        let client = StationClient::new(StationClientConfig::new("http://127.0.0.1:1")).unwrap();
        assert!(matches!(
            local.directory_source(Some(client.clone())),
            Ok(DirectorySource::File(_))
        ));

        let remote = ServiceConfig {
            source: SourceMode::Remote,
            upstream_url: Some("http://127.0.0.1:1".to_string()),
            ..ServiceConfig::default()
        };
        assert!(matches!(
            remote.directory_source(Some(client)),
            Ok(DirectorySource::Remote(_))
        ));
    }

    #[test]
    fn remote_without_client_is_an_error() {
        let remote = ServiceConfig {
            source: SourceMode::Remote,
            ..ServiceConfig::default()
        };
        assert_eq!(
            remote.directory_source(None).unwrap_err(),
            ConfigError::Missing {
                key: "BUS_UPSTREAM_URL"
            }
        );
    }
}
