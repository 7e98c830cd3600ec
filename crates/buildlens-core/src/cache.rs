//! TTL-gated caches for remotely discovered lists.
//!
//! Two instances exist (available models, available MCP servers), both owned
//! by the config store. The cache never evicts: `get` reports staleness and
//! still hands back the last items so callers can serve stale data while a
//! refresh runs.

use std::time::{Duration, Instant};

/// Shared TTL for both list caches.
pub const LIST_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// A list of names with a last-refresh timestamp.
#[derive(Debug, Clone, Default)]
pub struct ListCache {
    items: Vec<String>,
    last_refreshed: Option<Instant>,
}

impl ListCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite unconditionally and reset the timestamp, even for an empty
    /// list. Whether an empty fetch should be stored is the caller's call.
    pub fn put(&mut self, items: Vec<String>) {
        self.items = items;
        self.last_refreshed = Some(Instant::now());
    }

    /// Returns the cached items and whether they are still fresh.
    ///
    /// Fresh means non-empty and refreshed within `ttl`.
    pub fn get(&self, ttl: Duration) -> (Vec<String>, bool) {
        self.get_at(ttl, Instant::now())
    }

    /// Clock-injectable variant of [`get`](Self::get).
    pub fn get_at(&self, ttl: Duration, now: Instant) -> (Vec<String>, bool) {
        let fresh = !self.items.is_empty()
            && self
                .last_refreshed
                .is_some_and(|at| now.saturating_duration_since(at) <= ttl);
        (self.items.clone(), fresh)
    }
}
