//! Persistent cache store for Quay
//!
//! This crate provides a namespaced key/value cache with per-record expiry.
//! Values are JSON documents so that any serde type can be stored. Two
//! backends are available: an in-memory [`MemoryStore`] for tests and
//! single-process runs, and an on-disk [`FileStore`] that survives restarts.

pub mod file;
pub mod memory;
pub mod store;

// Re-export main types
pub use file::{CleanResult, FileStore};
pub use memory::MemoryStore;
pub use store::{CacheStore, CacheStoreExt};

use quay_core::error::QuayError;

/// Result type for cache operations
pub type CacheResult<T> = Result<T, QuayError>;
