use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

use crate::models::RawUserRecord;

// Cache entry with its expiry instant
#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub value: RawUserRecord,
    pub expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

// Identifier -> raw record, expired entries are dropped lazily on read
#[derive(Default)]
pub struct ProfileCache {
    entries: DashMap<String, CacheEntry>,
}

impl ProfileCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<RawUserRecord> {
        let now = Instant::now();

        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };

        // the shard guard is released above, a concurrent put may have refreshed the key
        if expired {
            self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        }
        None
    }

    pub fn put(&self, key: impl Into<String>, value: RawUserRecord, ttl: Duration) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Drops every expired entry, returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
