//! Fixed-window admission control per client identity.
//!
//! Each protected endpoint owns an independent limiter. A window starts with
//! an identity's first request and restarts on the first request after it
//! has elapsed; it does not slide, so a burst straddling a boundary can
//! exceed the nominal rate.
//!
//! State is process local. With N worker processes the effective cap is
//! `max_requests × N`; a shared counter store can be plugged in through
//! [`AdmissionStore`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::config::{Endpoint, RateLimitConfig};
use crate::error::ApiError;
use crate::http::IdentityResolver;
use crate::observability::metrics;

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted { count: u32 },
    Rejected { retry_after: Duration },
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted { .. })
    }
}

/// Counter storage deciding whether an identity may proceed.
pub trait AdmissionStore: Send + Sync {
    /// Record a request from `identity` at `now` and decide on it.
    fn admit(&self, identity: &str, now: Instant) -> Admission;

    /// Drop state that can no longer affect decisions. Returns entries removed.
    fn sweep(&self, _now: Instant) -> usize {
        0
    }

    /// Number of identities currently tracked.
    fn tracked(&self) -> usize;
}

/// Per-identity window state.
#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    count: u32,
    window_start: Instant,
}

/// In-memory fixed-window limiter.
pub struct FixedWindowLimiter {
    entries: DashMap<String, WindowEntry>,
    window: Duration,
    max_requests: u32,
    eviction_after: Duration,
}

impl FixedWindowLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            entries: DashMap::new(),
            window,
            max_requests,
            eviction_after: window.saturating_mul(10),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.window(), config.max_requests)
            .with_eviction_multiplier(config.eviction_multiplier)
    }

    /// Entries whose window started more than `multiplier` windows ago are swept.
    pub fn with_eviction_multiplier(mut self, multiplier: u32) -> Self {
        self.eviction_after = self.window.saturating_mul(multiplier.max(1));
        self
    }

    /// Current count for `identity`, if tracked.
    pub fn count(&self, identity: &str) -> Option<u32> {
        self.entries.get(identity).map(|e| e.count)
    }
}

impl AdmissionStore for FixedWindowLimiter {
    fn admit(&self, identity: &str, now: Instant) -> Admission {
        // The entry guard holds the shard lock for the whole read-modify-write.
        let mut entry = self
            .entries
            .entry(identity.to_string())
            .or_insert(WindowEntry {
                count: 0,
                window_start: now,
            });

        if now.saturating_duration_since(entry.window_start) > self.window {
            entry.count = 1;
            entry.window_start = now;
            return Admission::Admitted { count: 1 };
        }

        entry.count = entry.count.saturating_add(1);
        if entry.count > self.max_requests {
            let elapsed = now.saturating_duration_since(entry.window_start);
            Admission::Rejected {
                retry_after: self.window.saturating_sub(elapsed),
            }
        } else {
            Admission::Admitted { count: entry.count }
        }
    }

    fn sweep(&self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, e| now.saturating_duration_since(e.window_start) <= self.eviction_after);
        before.saturating_sub(self.entries.len())
    }

    fn tracked(&self) -> usize {
        self.entries.len()
    }
}

/// State for the rate limit middleware of a single endpoint.
#[derive(Clone)]
pub struct RateLimitState {
    pub endpoint: Endpoint,
    pub store: Arc<dyn AdmissionStore>,
    pub identity: IdentityResolver,
}

/// Middleware rejecting requests over the endpoint's cap with 429.
pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let identity = state.identity.resolve(request.headers(), request.extensions());

    match state.store.admit(identity.as_str(), Instant::now()) {
        Admission::Admitted { .. } => {
            let mut request = request;
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Admission::Rejected { retry_after } => {
            tracing::warn!(
                client = %identity,
                endpoint = %state.endpoint,
                "Rate limit exceeded"
            );
            metrics::record_rate_limited(state.endpoint);
            ApiError::RateLimitExceeded { retry_after }.into_response()
        }
    }
}

/// Periodically evicts stale entries from every limiter until shutdown.
pub struct Sweeper {
    limiters: Vec<(Endpoint, Arc<dyn AdmissionStore>)>,
    interval: Duration,
}

impl Sweeper {
    pub fn new(limiters: Vec<(Endpoint, Arc<dyn AdmissionStore>)>, interval: Duration) -> Self {
        Self { limiters, interval }
    }

    /// One pass over all limiters. Returns total entries removed.
    pub fn sweep_once(&self, now: Instant) -> usize {
        let mut removed = 0;
        for (endpoint, store) in &self.limiters {
            let pruned = store.sweep(now);
            metrics::record_tracked_clients(*endpoint, store.tracked());
            if pruned > 0 {
                tracing::debug!(endpoint = %endpoint, pruned, "Rate limiter sweep completed");
            }
            removed += pruned;
        }
        removed
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if self.limiters.is_empty() {
            return;
        }

        tracing::info!(interval = ?self.interval, "Rate limit sweeper starting");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep_once(Instant::now());
                }
                _ = shutdown.recv() => {
                    tracing::info!("Rate limit sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
