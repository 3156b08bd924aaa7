//! Session Housekeeping
//!
//! Periodically evicts sessions that have been idle longer than the TTL, so
//! the in-memory store does not grow without bound.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use sportsgpt_core::EventStore;

#[derive(Clone)]
pub struct Housekeeper {
    store: Arc<EventStore>,
    ttl: Duration,
    interval: Duration,
}

impl Housekeeper {
    pub fn new(store: Arc<EventStore>, ttl: Duration, interval: Duration) -> Self {
        Self {
            store,
            ttl,
            interval,
        }
    }

    /// Evict sessions idle longer than the TTL. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let Ok(ttl) = chrono::Duration::from_std(self.ttl) else {
            return 0;
        };
        let Some(cutoff) = Utc::now().checked_sub_signed(ttl) else {
            return 0;
        };
        self.store.evict_idle(cutoff)
    }

    /// Start a background loop that sweeps every `interval`.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            // the first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                let evicted = self.sweep();
                if evicted > 0 {
                    info!(evicted, remaining = self.store.len(), "Evicted idle sessions");
                } else {
                    debug!(sessions = self.store.len(), "Housekeeping sweep");
                }
            }
        })
    }
}
