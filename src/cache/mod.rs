//! Ephemeral TTL key-value cache used for password-reset tokens.
//!
//! The application treats the cache as an external collaborator: expiry is
//! the cache's responsibility, not the caller's. [`MemoryCache`] is the
//! in-process implementation (single node, tests, local dev); a networked
//! store can be dropped in behind [`SecretCache`] without touching the
//! flows.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// TTL key-value store for short-lived secrets.
///
/// Invariant relied on by the reset flow: `remove` returns the value at most
/// once; concurrent removals of the same key cannot both observe it.
#[async_trait]
pub trait SecretCache: Send + Sync {
    /// Store `value` under `key`, replacing any live value, expiring after
    /// `ttl`.
    async fn put(&self, key: &str, value: &str, ttl: Duration);

    /// Fetch the live value for `key`, if any.
    async fn get(&self, key: &str) -> Option<String>;

    /// Remove and return the live value for `key`. Single-shot.
    async fn remove(&self, key: &str) -> Option<String>;
}

struct Entry {
    value: String,
    deadline: Instant,
}

/// In-process cache: a mutex-guarded map with per-entry deadlines and an
/// opportunistic sweep of expired entries on write.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SecretCache for MemoryCache {
    async fn put(&self, key: &str, value: &str, ttl: Duration) {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        entries.retain(|_, entry| entry.deadline > now);
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                deadline: now + ttl,
            },
        );
    }

    async fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().await;
        entries
            .get(key)
            .filter(|entry| entry.deadline > Instant::now())
            .map(|entry| entry.value.clone())
    }

    async fn remove(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().await;
        entries
            .remove(key)
            .filter(|entry| entry.deadline > Instant::now())
            .map(|entry| entry.value)
    }
}

#[cfg(test)]
mod tests {
    use super::{MemoryCache, SecretCache};
    use std::time::Duration;

    #[tokio::test]
    async fn put_get_remove() {
        let cache = MemoryCache::new();
        cache
            .put("pwdreset:abc", "user-1", Duration::from_secs(60))
            .await;

        assert_eq!(cache.get("pwdreset:abc").await.as_deref(), Some("user-1"));
        assert_eq!(
            cache.remove("pwdreset:abc").await.as_deref(),
            Some("user-1")
        );

        // Removal is single-shot.
        assert!(cache.remove("pwdreset:abc").await.is_none());
        assert!(cache.get("pwdreset:abc").await.is_none());
    }

    #[tokio::test]
    async fn expired_entries_are_dead() {
        let cache = MemoryCache::new();
        cache.put("k", "v", Duration::ZERO).await;
        assert!(cache.get("k").await.is_none());
        assert!(cache.remove("k").await.is_none());
    }

    #[tokio::test]
    async fn put_replaces_live_value() {
        let cache = MemoryCache::new();
        cache.put("k", "old", Duration::from_secs(60)).await;
        cache.put("k", "new", Duration::from_secs(60)).await;
        assert_eq!(cache.get("k").await.as_deref(), Some("new"));
    }
}
