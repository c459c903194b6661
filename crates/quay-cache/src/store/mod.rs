//! The cache store interface

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use quay_core::error::QuayError;
use crate::CacheResult;

/// Namespaced key/value store with per-record expiry.
///
/// Implementations must treat expired records as absent. Errors while
/// reading are reported as misses; write errors are returned so callers can
/// decide whether a failed write-through matters.
pub trait CacheStore: Send + Sync {
    /// Fetch a fresh record
    fn get(&self, namespace: &str, key: &str) -> Option<Value>;

    /// Store a record that expires after `ttl_minutes`
    fn set(&self, namespace: &str, key: &str, value: Value, ttl_minutes: u64) -> CacheResult<()>;
}

/// Typed helpers over [`CacheStore`]
pub trait CacheStoreExt: CacheStore {
    /// Fetch and deserialize a record; undecodable records read as misses
    fn get_as<T: DeserializeOwned>(&self, namespace: &str, key: &str) -> Option<T> {
        let value = self.get(namespace, key)?;
        match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(namespace, key, error = %e, "Discarding undecodable cache record");
                None
            },
        }
    }

    /// Serialize and store a record
    fn set_as<T: Serialize>(
        &self,
        namespace: &str,
        key: &str,
        record: &T,
        ttl_minutes: u64,
    ) -> CacheResult<()> {
        let value = serde_json::to_value(record)
            .map_err(|e| QuayError::cache(format!("Failed to encode cache record {}", key), e))?;
        self.set(namespace, key, value, ttl_minutes)
    }
}

impl<S: CacheStore + ?Sized> CacheStoreExt for S {}

impl<S: CacheStore + ?Sized> CacheStore for std::sync::Arc<S> {
    fn get(&self, namespace: &str, key: &str) -> Option<Value> {
        (**self).get(namespace, key)
    }

    fn set(&self, namespace: &str, key: &str, value: Value, ttl_minutes: u64) -> CacheResult<()> {
        (**self).set(namespace, key, value, ttl_minutes)
    }
}
