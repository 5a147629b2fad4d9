//! The listing cache.
//!
//! A swappable key-value store with TTL semantics sits in front of the list
//! operations. Keys are namespaced (`objects:{bucket}:{prefix}:...`), so
//! mutation invalidation can flush exactly the listings a change could have
//! staled, by string prefix, without a global lock.

use std::time::{Duration, Instant};

use dashmap::DashMap;

/// A pluggable cache backend. Implementations must make each operation atomic
/// per key; a prefix flush must not tear a concurrent single-key write.
pub trait Cache: Send + Sync + std::fmt::Debug {
    /// Fetch a live entry, or `None` when absent or expired.
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Store an entry with a time-to-live.
    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration);

    /// Remove a single entry.
    fn delete(&self, key: &str);

    /// Remove every entry whose key starts with `prefix`.
    fn flush_prefix(&self, prefix: &str);

    /// Remove everything.
    fn flush_all(&self);
}

#[derive(Debug, Clone)]
struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// The default in-process cache, backed by a concurrent map. Expired entries
/// are dropped lazily on read.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, Entry>,
}

impl MemoryCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        let expired = {
            let entry = self.entries.get(key)?;
            if entry.expires_at > Instant::now() {
                return Some(entry.value.clone());
            }
            true
        };
        if expired {
            self.entries.remove(key);
        }
        None
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) {
        self.entries.insert(
            key.to_owned(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    fn delete(&self, key: &str) {
        self.entries.remove(key);
    }

    fn flush_prefix(&self, prefix: &str) {
        self.entries.retain(|key, _| !key.starts_with(prefix));
    }

    fn flush_all(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_store_and_fetch_within_ttl() {
        let cache = MemoryCache::new();
        cache.set("objects:media:photos/:x", b"page".to_vec(), Duration::from_secs(60));
        assert_eq!(cache.get("objects:media:photos/:x"), Some(b"page".to_vec()));
    }

    #[test]
    fn test_should_expire_entries() {
        let cache = MemoryCache::new();
        cache.set("k", b"v".to_vec(), Duration::ZERO);
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_should_delete_single_entry() {
        let cache = MemoryCache::new();
        cache.set("a", b"1".to_vec(), Duration::from_secs(60));
        cache.set("b", b"2".to_vec(), Duration::from_secs(60));
        cache.delete("a");
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(b"2".to_vec()));
    }

    #[test]
    fn test_should_flush_by_prefix_only() {
        let cache = MemoryCache::new();
        cache.set("objects:media:photos/:a", b"1".to_vec(), Duration::from_secs(60));
        cache.set("objects:media:photos/2024/:b", b"2".to_vec(), Duration::from_secs(60));
        cache.set("objects:media:docs/:c", b"3".to_vec(), Duration::from_secs(60));
        cache.set("objects:backups:photos/:d", b"4".to_vec(), Duration::from_secs(60));

        cache.flush_prefix("objects:media:photos/");

        assert_eq!(cache.get("objects:media:photos/:a"), None);
        assert_eq!(cache.get("objects:media:photos/2024/:b"), None);
        assert!(cache.get("objects:media:docs/:c").is_some());
        assert!(cache.get("objects:backups:photos/:d").is_some());
    }

    #[test]
    fn test_should_flush_everything() {
        let cache = MemoryCache::new();
        cache.set("a", b"1".to_vec(), Duration::from_secs(60));
        cache.set("b", b"2".to_vec(), Duration::from_secs(60));
        cache.flush_all();
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), None);
    }
}
