//! Keyed cache of event lookups and the invalidation seam used by the manage pipeline.

use std::{
    fmt,
    time::{Duration, Instant},
};

use dashmap::DashMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::state::event::Event;

/// General cache key holding the event whose tournament is currently running.
pub const ACTIVE_TOURNAMENT_EVENT_KEY: &str = "active-tournament-event";

/// Logical partition of the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheNamespace {
    General,
    EventsById,
    EventsByName,
}

impl fmt::Display for CacheNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CacheNamespace::General => "general",
            CacheNamespace::EventsById => "events-by-id",
            CacheNamespace::EventsByName => "events-by-name",
        })
    }
}

/// Failure reported by a cache backend.
#[derive(Debug, Error)]
#[error("cache {namespace} rejected invalidation of `{key}`: {message}")]
pub struct CacheError {
    pub namespace: CacheNamespace,
    pub key: String,
    pub message: String,
}

/// Drops cached entries so the next lookup reads the store.
pub trait CacheInvalidator: Send + Sync {
    fn invalidate(&self, namespace: CacheNamespace, key: &str) -> Result<(), CacheError>;
}

/// Invalidate and log failures; cache misses are recoverable so callers never fail on them.
pub fn invalidate_logged<C>(cache: &C, namespace: CacheNamespace, key: &str)
where
    C: CacheInvalidator + ?Sized,
{
    if let Err(err) = cache.invalidate(namespace, key) {
        warn!(%namespace, key, error = %err, "cache invalidation failed");
    }
}

/// Read-through cache of events. A cached `None` records a known miss.
pub trait EventCache: CacheInvalidator {
    fn get(&self, namespace: CacheNamespace, key: &str) -> Option<Option<Event>>;
    fn insert(&self, namespace: CacheNamespace, key: &str, value: Option<Event>);
}

struct CachedValue {
    value: Option<Event>,
    expires_at: Instant,
}

/// [`EventCache`] kept in process memory with a fixed time to live.
pub struct MemoryEventCache {
    entries: DashMap<(CacheNamespace, String), CachedValue>,
    ttl: Duration,
}

impl MemoryEventCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Whether a live entry exists for the key.
    pub fn contains(&self, namespace: CacheNamespace, key: &str) -> bool {
        self.get(namespace, key).is_some()
    }
}

impl CacheInvalidator for MemoryEventCache {
    fn invalidate(&self, namespace: CacheNamespace, key: &str) -> Result<(), CacheError> {
        if self.entries.remove(&(namespace, key.to_owned())).is_some() {
            debug!(%namespace, key, "cache entry invalidated");
        }
        Ok(())
    }
}

impl EventCache for MemoryEventCache {
    fn get(&self, namespace: CacheNamespace, key: &str) -> Option<Option<Event>> {
        let cache_key = (namespace, key.to_owned());
        let hit = self.entries.get(&cache_key).map(|cached| {
            (cached.expires_at > Instant::now()).then(|| cached.value.clone())
        })?;
        if hit.is_none() {
            self.entries.remove(&cache_key);
        }
        hit
    }

    fn insert(&self, namespace: CacheNamespace, key: &str, value: Option<Event>) {
        self.entries.insert(
            (namespace, key.to_owned()),
            CachedValue {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> Event {
        Event {
            name: name.into(),
            ..Event::blank()
        }
    }

    #[test]
    fn namespaces_are_isolated() {
        let cache = MemoryEventCache::new(Duration::from_secs(60));
        cache.insert(CacheNamespace::EventsByName, "1", Some(named("jam-1")));
        assert!(cache.get(CacheNamespace::EventsById, "1").is_none());
        assert_eq!(
            cache
                .get(CacheNamespace::EventsByName, "1")
                .flatten()
                .map(|e| e.name),
            Some("jam-1".to_owned())
        );
    }

    #[test]
    fn known_misses_are_cached() {
        let cache = MemoryEventCache::new(Duration::from_secs(60));
        cache.insert(CacheNamespace::General, ACTIVE_TOURNAMENT_EVENT_KEY, None);
        assert_eq!(
            cache.get(CacheNamespace::General, ACTIVE_TOURNAMENT_EVENT_KEY),
            Some(None)
        );
    }

    #[test]
    fn expired_entries_are_dropped() {
        let cache = MemoryEventCache::new(Duration::ZERO);
        cache.insert(CacheNamespace::EventsByName, "jam-1", Some(named("jam-1")));
        assert!(!cache.contains(CacheNamespace::EventsByName, "jam-1"));
    }

    #[test]
    fn invalidation_removes_entry() {
        let cache = MemoryEventCache::new(Duration::from_secs(60));
        cache.insert(CacheNamespace::EventsByName, "jam-1", Some(named("jam-1")));
        cache
            .invalidate(CacheNamespace::EventsByName, "jam-1")
            .unwrap();
        assert!(!cache.contains(CacheNamespace::EventsByName, "jam-1"));
    }
}
