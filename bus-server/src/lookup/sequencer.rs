//! Latest-request-wins sequencing.

use tokio::sync::{Mutex, MutexGuard};

/// Identifies one lookup attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Hands out increasing tickets and lets only the newest one commit.
///
/// Starting a request and committing its result take the same lock, so a
/// result is never committed after a newer request has started.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: Mutex<u64>,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, superseding every earlier ticket.
    pub async fn begin(&self) -> Ticket {
        let mut latest = self.latest.lock().await;
        *latest += 1;
        Ticket(*latest)
    }

    /// Lock the sequencer if `ticket` is still the newest.
    ///
    /// While the guard is held no newer request can begin, so the caller
    /// can publish results without racing a fresher request.
    pub async fn hold(&self, ticket: Ticket) -> Option<MutexGuard<'_, u64>> {
        let latest = self.latest.lock().await;
        (*latest == ticket.0).then_some(latest)
    }
}
