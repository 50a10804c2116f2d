use std::error::Error;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bus_server::cache::{FileStore, RankingCache};
use bus_server::config::{ConfigError, ServiceConfig, SourceMode};
use bus_server::stations::{
    ConfiguredSource, LocalRanking, RemoteRanking, StationClient, StationDirectory,
};
use bus_server::web::{AppState, create_router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bus_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServiceConfig::from_env()?;

    let client = config.client_config().map(StationClient::new).transpose()?;

    // Fail fast if no station data can be loaded
    let directory = StationDirectory::load(config.directory_source(client.clone())?).await?;
    info!(stations = directory.len().await, "station directory ready");

    let source = match (config.source, client) {
        (SourceMode::Local, _) => {
            ConfiguredSource::Local(LocalRanking::new(directory.clone(), config.result_limit))
        }
        (SourceMode::Remote, Some(client)) => ConfiguredSource::Remote(RemoteRanking::new(client)),
        (SourceMode::Remote, None) => {
            return Err(ConfigError::Missing {
                key: "BUS_UPSTREAM_URL",
            }
            .into());
        }
    };

    let cache = match &config.cache_path {
        Some(path) => {
            let store = FileStore::open(path)?;
            info!(path = %path.display(), "using durable cache");
            RankingCache::new(store, &config.cache_config())
        }
        None => RankingCache::in_memory(&config.cache_config()),
    };

    // Station identity changes rarely; reload it once per station TTL
    let refreshing = directory.clone();
    let station_ttl = config.station_ttl;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(station_ttl);
        interval.tick().await; // First tick is immediate, skip it
        loop {
            interval.tick().await;
            match refreshing.refresh().await {
                Ok(count) => info!(count, "refreshed station directory"),
                Err(e) => warn!(error = %e, "failed to refresh station directory"),
            }
        }
    });

    // Expired rankings are also dropped lazily on read; this keeps the
    // durable store from growing with buckets nobody asks for again
    let sweeping = cache.clone();
    let routing_ttl = config.routing_ttl;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(routing_ttl);
        interval.tick().await;
        loop {
            interval.tick().await;
            if let Err(e) = sweeping.evict_expired().await {
                warn!(error = %e, "failed to sweep expired cache entries");
            }
        }
    });

    info!(source = %config.source, "ranking strategy selected");
    let state = AppState::new(directory, source, cache, config.lookup_config());
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "bus station service listening");
    info!("  GET /health             - Health check");
    info!("  GET /stations           - All known stations");
    info!("  GET /stations/:id       - One station by id");
    info!("  GET /closest-stations   - Nearest stations to ?lat=&lon=");

    axum::serve(listener, app).await?;
    Ok(())
}
