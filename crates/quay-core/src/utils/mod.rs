//! Utility functions and helpers.
//!
//! Common functionality used across multiple Quay crates.

pub mod hash;
pub mod url;

// Re-export commonly used utilities
pub use hash::cache_key_hash;
pub use self::url::{normalize_registry_url, url_host};
