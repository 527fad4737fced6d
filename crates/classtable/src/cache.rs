//! TTL-based caching for table list reads.
//!
//! The original front end coordinated list/detail fetches through a
//! request-caching library; this is the gateway's equivalent. Entries
//! are keyed by (session, table) and dropped on mutation.

use dashmap::DashMap;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::time::{Duration, Instant};

/// A session key derived from the access token, used for cache lookups.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct SessionKey(String);

impl SessionKey {
    /// Creates a session key from an access token.
    ///
    /// The token is hashed so the cache never stores raw credentials.
    pub fn from_token(token: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        let result = hasher.finalize();
        // Use first 16 bytes as hex string
        let hash = hex::encode(&result[..16]);
        Self(hash)
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Only show first 8 chars for privacy
        write!(f, "{}...", &self.0[..8.min(self.0.len())])
    }
}

#[derive(Clone)]
struct CachedList {
    rows: Vec<Value>,
    cached_at: Instant,
    ttl: Duration,
}

/// Thread-safe cache of table list responses.
///
/// Uses DashMap for concurrent access without external locking.
pub struct ListCache {
    entries: DashMap<(SessionKey, String), CachedList>,
    default_ttl: Duration,
}

impl ListCache {
    /// Creates a new cache with the specified default TTL.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl,
        }
    }

    /// Gets cached rows if present and not expired.
    pub fn get(&self, key: &SessionKey, table: &str) -> Option<Vec<Value>> {
        let map_key = (key.clone(), table.to_string());
        self.entries.get(&map_key).and_then(|entry| {
            if entry.cached_at.elapsed() < entry.ttl {
                Some(entry.rows.clone())
            } else {
                // Entry expired, remove it
                drop(entry);
                self.entries.remove(&map_key);
                None
            }
        })
    }

    /// Inserts rows for a (session, table) pair with the default TTL.
    pub fn insert(&self, key: SessionKey, table: &str, rows: Vec<Value>) {
        self.insert_with_ttl(key, table, rows, self.default_ttl);
    }

    /// Inserts rows with a custom TTL.
    pub fn insert_with_ttl(&self, key: SessionKey, table: &str, rows: Vec<Value>, ttl: Duration) {
        self.entries.insert(
            (key, table.to_string()),
            CachedList {
                rows,
                cached_at: Instant::now(),
                ttl,
            },
        );
    }

    /// Drops the cached rows for one (session, table) pair.
    pub fn invalidate(&self, key: &SessionKey, table: &str) {
        self.entries.remove(&(key.clone(), table.to_string()));
    }

    /// Drops everything, e.g. on logout.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

/// Helper module for hex encoding (avoiding extra dependency).
mod hex {
    pub fn encode(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_session_key_hashing() {
        let key1 = SessionKey::from_token("token123");
        let key2 = SessionKey::from_token("token123");
        let key3 = SessionKey::from_token("token456");

        assert_eq!(key1, key2);
        assert_ne!(key1, key3);
    }

    #[test]
    fn test_insert_get_invalidate() {
        let cache = ListCache::new(Duration::from_secs(60));
        let key = SessionKey::from_token("token");
        let rows = vec![json!({"id": "c1", "name": "Algebra"})];

        assert!(cache.get(&key, "courses").is_none());
        cache.insert(key.clone(), "courses", rows.clone());
        assert_eq!(cache.get(&key, "courses"), Some(rows));

        // Other tables under the same session are independent
        assert!(cache.get(&key, "classrooms").is_none());

        cache.invalidate(&key, "courses");
        assert!(cache.get(&key, "courses").is_none());
    }

    #[test]
    fn test_expired_entry_is_dropped() {
        let cache = ListCache::new(Duration::from_secs(60));
        let key = SessionKey::from_token("token");

        cache.insert_with_ttl(key.clone(), "courses", vec![json!({})], Duration::ZERO);
        assert!(cache.get(&key, "courses").is_none());
    }
}
