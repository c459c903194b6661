//! Blake3 hashing utilities for cache keys.

/// Stable hex digest for a `(namespace, key)` pair.
///
/// The namespace and key are length-prefixed so that `("ab", "c")` and
/// `("a", "bc")` never collide.
pub fn cache_key_hash(namespace: &str, key: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(namespace.len() as u64).to_le_bytes());
    hasher.update(namespace.as_bytes());
    hasher.update(&(key.len() as u64).to_le_bytes());
    hasher.update(key.as_bytes());
    hasher.finalize().to_hex().to_string()
}
