//! In-memory cache store
//!
//! Used by tests and by datasources built without a persistent store.
//! Records live as long as the process does.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde_json::Value;

use crate::store::CacheStore;
use crate::CacheResult;

#[derive(Debug, Clone)]
struct MemoryRecord {
    value: Value,
    expires_at: Instant,
}

impl MemoryRecord {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Namespaced in-memory store with per-record expiry
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: DashMap<(String, String), MemoryRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Store a record with an expiry finer than whole minutes
    pub fn set_for(&self, namespace: &str, key: &str, value: Value, ttl: Duration) {
        let record = MemoryRecord {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.records
            .insert((namespace.to_string(), key.to_string()), record);
    }

    /// Number of records held, expired ones included
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop expired records and return how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.records.len();
        self.records.retain(|_, record| !record.is_expired(now));
        before.saturating_sub(self.records.len())
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, namespace: &str, key: &str) -> Option<Value> {
        let cache_key = (namespace.to_string(), key.to_string());
        {
            let record = self.records.get(&cache_key)?;
            if !record.is_expired(Instant::now()) {
                return Some(record.value.clone());
            }
        }

        // A concurrent set may have replaced the record since the read
        self.records
            .remove_if(&cache_key, |_, record| record.is_expired(Instant::now()));
        None
    }

    fn set(&self, namespace: &str, key: &str, value: Value, ttl_minutes: u64) -> CacheResult<()> {
        self.set_for(namespace, key, value, Duration::from_secs(ttl_minutes * 60));
        Ok(())
    }
}
