//! One device's "stations near me" lifecycle.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::cache::RankingCache;
use crate::domain::{Coordinate, RankedStation};
use crate::stations::{SourceError, StationSource};

use super::error::LookupError;
use super::location::{LocationError, LocationProvider, PermissionStatus};
use super::retry::{RetryConfig, retry};
use super::sequencer::{RequestSequencer, Ticket};
use super::state::{LookupState, NearbyStations};

/// Configuration for a lookup.
#[derive(Debug, Clone)]
pub struct LookupConfig {
    /// After showing a cached answer, fetch a live one in the background.
    pub refresh_on_hit: bool,

    /// Automatic retries for transient network errors.
    pub retry: RetryConfig,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            refresh_on_hit: true,
            retry: RetryConfig::default(),
        }
    }
}

struct Inner<L, S> {
    location: Arc<L>,
    source: Arc<S>,
    cache: RankingCache,
    config: LookupConfig,
    sequencer: RequestSequencer,
    permission_granted: AtomicBool,
    state: watch::Sender<LookupState>,
}

/// Finds the stations nearest the user and publishes progress.
///
/// Every state change is sent on a watch channel; see [`subscribe`].
/// Only the most recent [`refresh`] may change the published state or
/// write the cache.
///
/// [`subscribe`]: NearbyLookup::subscribe
/// [`refresh`]: NearbyLookup::refresh
pub struct NearbyLookup<L, S> {
    inner: Arc<Inner<L, S>>,
}

impl<L, S> Clone for NearbyLookup<L, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L, S> NearbyLookup<L, S>
where
    L: LocationProvider + 'static,
    S: StationSource + 'static,
{
    pub fn new(location: Arc<L>, source: Arc<S>, cache: RankingCache, config: LookupConfig) -> Self {
        let (state, _) = watch::channel(LookupState::Idle);
        Self {
            inner: Arc::new(Inner {
                location,
                source,
                cache,
                config,
                sequencer: RequestSequencer::new(),
                permission_granted: AtomicBool::new(false),
                state,
            }),
        }
    }

    /// Watch state changes.
    pub fn subscribe(&self) -> watch::Receiver<LookupState> {
        self.inner.state.subscribe()
    }

    /// The current state.
    pub fn state(&self) -> LookupState {
        self.inner.state.borrow().clone()
    }

    /// Run one lookup from the user's current position.
    ///
    /// Returns the stations shown at the end of this call: either a live
    /// answer, or a cached one (a background refresh may replace it
    /// later). Returns [`LookupError::Superseded`] if a newer refresh
    /// started first; in that case nothing was published.
    pub async fn refresh(&self) -> Result<Arc<NearbyStations>, LookupError> {
        let ticket = self.inner.sequencer.begin().await;

        if !self.inner.permission_granted.load(Ordering::Acquire) {
            self.publish(ticket, LookupState::RequestingPermission).await?;
            match self.inner.location.request_permission().await {
                PermissionStatus::Granted => {
                    self.inner.permission_granted.store(true, Ordering::Release);
                }
                PermissionStatus::Denied => {
                    return self.fail(ticket, LookupError::PermissionDenied).await;
                }
            }
        }

        self.publish(ticket, LookupState::Locating).await?;
        let origin = match self.inner.location.current_position().await {
            Ok(origin) => origin,
            Err(e) => {
                if e == LocationError::PermissionDenied {
                    self.inner.permission_granted.store(false, Ordering::Release);
                }
                return self.fail(ticket, e.into()).await;
            }
        };

        match self.inner.cache.get(origin).await {
            Ok(hit) => {
                let cached = Arc::new(NearbyStations {
                    origin,
                    stations: hit.stations,
                    cached_at: Some(hit.stored_at),
                });
                debug!(%origin, stored_at = %hit.stored_at, "showing cached stations");
                self.publish(ticket, LookupState::CacheHitDisplaying(Arc::clone(&cached)))
                    .await?;

                if self.inner.config.refresh_on_hit {
                    let this = self.clone();
                    let shown = Arc::clone(&cached);
                    tokio::spawn(async move { this.refresh_in_background(ticket, shown).await });
                } else {
                    self.publish(ticket, LookupState::Success(Arc::clone(&cached)))
                        .await?;
                }
                Ok(cached)
            }
            Err(_) => {
                self.publish(ticket, LookupState::Fetching).await?;
                match self.fetch(origin).await {
                    Ok(stations) => self.commit(ticket, origin, stations).await,
                    Err(e) => self.fail(ticket, e.into()).await,
                }
            }
        }
    }

    async fn fetch(&self, origin: Coordinate) -> Result<Vec<RankedStation>, SourceError> {
        let source = &self.inner.source;
        retry(&self.inner.config.retry, SourceError::is_retryable, || {
            source.nearby(origin)
        })
        .await
    }

    async fn refresh_in_background(&self, ticket: Ticket, shown: Arc<NearbyStations>) {
        let origin = shown.origin;
        match self.fetch(origin).await {
            Ok(stations) => {
                if let Err(e) = self.commit(ticket, origin, stations).await {
                    debug!(error = %e, "background refresh discarded");
                }
            }
            Err(e) => {
                warn!(%origin, error = %e, "background refresh failed, keeping cached stations");
                // Superseded means a newer lookup owns the state now.
                let _ = self.publish(ticket, LookupState::Success(shown)).await;
            }
        }
    }

    /// Store and publish a live result, if `ticket` is still current.
    async fn commit(
        &self,
        ticket: Ticket,
        origin: Coordinate,
        stations: Vec<RankedStation>,
    ) -> Result<Arc<NearbyStations>, LookupError> {
        let Some(_held) = self.inner.sequencer.hold(ticket).await else {
            debug!(%origin, "dropping stale result");
            return Err(LookupError::Superseded);
        };

        if let Err(e) = self.inner.cache.put(origin, stations.clone()).await {
            warn!(%origin, error = %e, "failed to cache ranked stations");
        }

        let nearby = Arc::new(NearbyStations {
            origin,
            stations,
            cached_at: None,
        });
        info!(%origin, count = nearby.stations.len(), "found nearby stations");
        self.set_state(LookupState::Success(Arc::clone(&nearby)));
        Ok(nearby)
    }

    async fn fail<T>(&self, ticket: Ticket, error: LookupError) -> Result<T, LookupError> {
        let Some(_held) = self.inner.sequencer.hold(ticket).await else {
            return Err(LookupError::Superseded);
        };
        warn!(%error, "lookup failed");
        self.set_state(LookupState::Error(error.clone()));
        Err(error)
    }

    async fn publish(&self, ticket: Ticket, next: LookupState) -> Result<(), LookupError> {
        let Some(_held) = self.inner.sequencer.hold(ticket).await else {
            return Err(LookupError::Superseded);
        };
        self.set_state(next);
        Ok(())
    }

    /// Callers must hold the sequencer.
    fn set_state(&self, next: LookupState) {
        let next_phase = next.phase();
        let prev = self.inner.state.send_replace(next);
        debug_assert!(
            prev.phase().allows(next_phase),
            "illegal transition {:?} -> {:?}",
            prev.phase(),
            next_phase
        );
        debug!(from = ?prev.phase(), to = ?next_phase, "lookup state");
    }
}
