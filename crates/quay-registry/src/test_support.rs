//! Shared helpers for unit tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use quay_cache::{CacheResult, CacheStore, MemoryStore};
use quay_core::types::{CredentialLookup, HostCredentials};

use crate::http::{HttpClient, HttpConfig, RetryConfig};

/// Memory store that counts every interaction
#[derive(Debug, Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    gets: AtomicUsize,
    sets: AtomicUsize,
}

impl RecordingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    pub fn interactions(&self) -> usize {
        self.gets() + self.sets()
    }
}

impl CacheStore for RecordingStore {
    fn get(&self, namespace: &str, key: &str) -> Option<Value> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(namespace, key)
    }

    fn set(&self, namespace: &str, key: &str, value: Value, ttl_minutes: u64) -> CacheResult<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.inner.set(namespace, key, value, ttl_minutes)
    }
}

/// Credential lookup returning the same credentials for every URL
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials(pub HostCredentials);

impl CredentialLookup for StaticCredentials {
    fn find(&self, _host_type: &str, _url: &str) -> HostCredentials {
        self.0.clone()
    }
}

/// Transport with a short timeout and no retries
pub fn test_http() -> HttpClient {
    HttpClient::with_config(HttpConfig {
        timeout: Duration::from_secs(2),
        retry: RetryConfig::none(),
        ..HttpConfig::default()
    })
    .unwrap()
}
