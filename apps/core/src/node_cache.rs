use std::time::{Duration, Instant};

use crate::model::PeerNode;
use crate::status::{fetch_nodes, StatusSource};

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(10);

pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Default, Clone)]
pub struct NodeCache {
    nodes: Vec<PeerNode>,
    fetched_at: Option<Instant>,
}

impl NodeCache {
    fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        self.fetched_at
            .is_some_and(|at| now.saturating_duration_since(at) < ttl)
    }
}

/// Owns the status source and the cached node list. Failed fetches are
/// cached like successful ones, so a dead daemon is retried once per TTL.
pub struct StatusProvider<S, C = SystemClock> {
    source: S,
    clock: C,
    ttl: Duration,
    cache: NodeCache,
}

impl<S: StatusSource> StatusProvider<S, SystemClock> {
    pub fn new(source: S) -> Self {
        Self::with_clock(source, SystemClock, DEFAULT_CACHE_TTL)
    }
}

impl<S: StatusSource, C: Clock> StatusProvider<S, C> {
    pub fn with_clock(source: S, clock: C, ttl: Duration) -> Self {
        Self {
            source,
            clock,
            ttl,
            cache: NodeCache::default(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn list_nodes(&mut self) -> &[PeerNode] {
        let now = self.clock.now();
        if self.cache.is_fresh(now, self.ttl) {
            tracing::debug!(count = self.cache.nodes.len(), "node cache hit");
            return &self.cache.nodes;
        }

        self.cache = NodeCache {
            nodes: fetch_nodes(&self.source),
            fetched_at: Some(now),
        };
        tracing::debug!(count = self.cache.nodes.len(), "node cache refreshed");
        &self.cache.nodes
    }

    pub fn invalidate(&mut self) {
        self.cache.fetched_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::{NodeCache, StatusProvider, DEFAULT_CACHE_TTL};
    use crate::status::TailscaleCli;
    use std::time::{Duration, Instant};

    #[test]
    fn default_provider_uses_ten_second_ttl() {
        let provider = StatusProvider::new(TailscaleCli::default());
        assert_eq!(provider.ttl(), DEFAULT_CACHE_TTL);
        assert_eq!(DEFAULT_CACHE_TTL, Duration::from_secs(10));
    }

    #[test]
    fn empty_cache_is_never_fresh() {
        let cache = NodeCache::default();
        assert!(!cache.is_fresh(Instant::now(), Duration::from_secs(10)));
    }

    #[test]
    fn freshness_boundary_is_exclusive() {
        let start = Instant::now();
        let cache = NodeCache {
            nodes: Vec::new(),
            fetched_at: Some(start),
        };
        let ttl = Duration::from_secs(10);
        assert!(cache.is_fresh(start + Duration::from_millis(9_999), ttl));
        assert!(!cache.is_fresh(start + ttl, ttl));
    }
}
