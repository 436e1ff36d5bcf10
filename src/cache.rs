//! Single-slot freshness cache.
//!
//! Holds the last fetch result for a bounded time-to-live. Callers pass the
//! current [`Instant`] in, which keeps expiry deterministic under test. The
//! slot is replaced whole on every store; readers share it through an `Arc`.

use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct FreshnessCache<T> {
    ttl: Duration,
    slot: Option<(Instant, Arc<T>)>,
}

impl<T> FreshnessCache<T> {
    /// A zero `ttl` disables reuse: every `get` misses.
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, slot: None }
    }

    /// The cached value while it is younger than the TTL.
    pub fn get(&self, now: Instant) -> Option<Arc<T>> {
        match &self.slot {
            Some((stored_at, value)) if now.saturating_duration_since(*stored_at) < self.ttl => {
                Some(Arc::clone(value))
            }
            _ => None,
        }
    }

    /// Replace the slot and return a handle to the new value.
    pub fn store(&mut self, value: T, now: Instant) -> Arc<T> {
        let value = Arc::new(value);
        self.slot = Some((now, Arc::clone(&value)));
        value
    }

    /// How long ago the current value was stored.
    pub fn age(&self, now: Instant) -> Option<Duration> {
        self.slot
            .as_ref()
            .map(|(stored_at, _)| now.saturating_duration_since(*stored_at))
    }
}
