//! Session-handle store.
//!
//! # Responsibilities
//! - Map opaque client ids to upstream credentials
//! - Expire handles after an idle period and bound the number of live handles
//! - Purge expired handles in the background until shutdown
//!
//! # Design Decisions
//! - `DashMap` shards the map; no global lock on the request path
//! - Lookups refresh the idle timer
//! - At capacity, expired entries go first, then the least recently used one

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::config::SessionConfig;
use crate::observability::metrics;

/// Upstream session cookie value plus API token.
#[derive(Clone, PartialEq, Eq)]
pub struct UpstreamCredentials {
    pub session_id: String,
    pub token: String,
}

impl fmt::Debug for UpstreamCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamCredentials")
            .field("session_id", &"<redacted>")
            .field("token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
struct SessionEntry {
    credentials: UpstreamCredentials,
    created_at: Instant,
    last_seen: Instant,
}

/// Shared, cheaply cloneable handle table.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<DashMap<String, SessionEntry>>,
    ttl: Duration,
    max_entries: usize,
}

impl SessionStore {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(Duration::from_secs(config.ttl_secs), config.max_entries)
    }

    /// Store `credentials` under a fresh UUID v4 client id and return the id.
    pub fn register(&self, credentials: UpstreamCredentials) -> String {
        if self.inner.len() >= self.max_entries {
            self.purge_expired();
            while self.inner.len() >= self.max_entries {
                if !self.evict_least_recent() {
                    break;
                }
            }
        }

        let client_id = uuid::Uuid::new_v4().to_string();
        let now = Instant::now();
        self.inner.insert(
            client_id.clone(),
            SessionEntry {
                credentials,
                created_at: now,
                last_seen: now,
            },
        );

        metrics::record_session_event("registered", 1);
        metrics::record_sessions_active(self.inner.len());
        tracing::debug!(sessions = self.inner.len(), "Session handle registered");
        client_id
    }

    /// Credentials for a live handle. Refreshes its idle timer; an expired
    /// handle is removed and reported as absent.
    pub fn resolve(&self, client_id: &str) -> Option<UpstreamCredentials> {
        let now = Instant::now();
        let credentials = {
            let mut entry = self.inner.get_mut(client_id)?;
            if now.duration_since(entry.last_seen) < self.ttl {
                entry.last_seen = now;
                Some(entry.credentials.clone())
            } else {
                None
            }
        };

        if credentials.is_none() {
            let ttl = self.ttl;
            if self
                .inner
                .remove_if(client_id, |_, e| now.duration_since(e.last_seen) >= ttl)
                .is_some()
            {
                metrics::record_session_event("expired", 1);
                metrics::record_sessions_active(self.inner.len());
            }
        }
        credentials
    }

    /// Drop a handle. Returns whether it existed.
    pub fn revoke(&self, client_id: &str) -> bool {
        let removed = self.inner.remove(client_id).is_some();
        if removed {
            metrics::record_session_event("revoked", 1);
            metrics::record_sessions_active(self.inner.len());
        }
        removed
    }

    /// Remove every handle idle for at least the TTL. Returns how many went.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let ttl = self.ttl;
        let before = self.inner.len();
        self.inner
            .retain(|_, entry| now.duration_since(entry.last_seen) < ttl);
        let purged = before.saturating_sub(self.inner.len());
        if purged > 0 {
            metrics::record_session_event("expired", purged as u64);
            metrics::record_sessions_active(self.inner.len());
            tracing::debug!(purged, remaining = self.inner.len(), "Expired session handles purged");
        }
        purged
    }

    fn evict_least_recent(&self) -> bool {
        let oldest = self
            .inner
            .iter()
            .min_by_key(|entry| (entry.last_seen, entry.created_at))
            .map(|entry| entry.key().clone());

        match oldest {
            Some(client_id) => {
                self.inner.remove(&client_id);
                metrics::record_session_event("evicted", 1);
                tracing::info!(max_entries = self.max_entries, "Session store full, evicted least recently used handle");
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Purge expired handles every `interval` until `shutdown` fires.
    pub async fn run_sweeper(self, interval: Duration, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        tracing::info!(interval = ?interval, ttl = ?self.ttl, "Session sweeper started");
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.purge_expired();
                }
                _ = shutdown.recv() => {
                    tracing::info!("Session sweeper stopping");
                    break;
                }
            }
        }
    }
}
