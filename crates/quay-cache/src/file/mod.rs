//! On-disk cache store
//!
//! Records are stored as individual JSON files addressed by the Blake3 hash
//! of their `(namespace, key)` pair:
//!
//! ```text
//! <root>/ab/cd/abcd....json
//! ```
//!
//! Each file carries its own expiry so no separate index is needed.

use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use quay_core::error::QuayError;
use quay_core::utils::cache_key_hash;

use crate::store::CacheStore;
use crate::CacheResult;

/// A record as written to disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    /// Namespace the record belongs to
    pub namespace: String,
    /// Key within the namespace
    pub key: String,
    /// Stored value
    pub value: Value,
    /// When the record was written (unix seconds)
    pub stored_at: i64,
    /// When the record stops being served (unix seconds)
    pub expires_at: i64,
}

impl FileRecord {
    /// Whether the record is past its expiry
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.expires_at
    }
}

/// Persistent cache store backed by a directory tree
#[derive(Debug)]
pub struct FileStore {
    /// Root directory for records (~/.cache/quay)
    root_path: Utf8PathBuf,
}

impl FileStore {
    /// Open a store rooted at `root_path`, creating the directory
    pub fn new<P: AsRef<Utf8Path>>(root_path: P) -> CacheResult<Self> {
        let root_path = root_path.as_ref().to_path_buf();

        fs::create_dir_all(&root_path)
            .map_err(|e| QuayError::io(format!("Failed to create cache directory {}", root_path), e))?;

        Ok(Self { root_path })
    }

    /// Get the root path of the store
    pub fn root_path(&self) -> &Utf8Path {
        &self.root_path
    }

    /// Get the storage path for a record
    fn record_path(&self, namespace: &str, key: &str) -> Utf8PathBuf {
        let hex = cache_key_hash(namespace, key);
        let prefix1 = &hex[0..2];
        let prefix2 = &hex[2..4];
        self.root_path
            .join(prefix1)
            .join(prefix2)
            .join(format!("{}.json", hex))
    }

    fn read_record(path: &Utf8Path) -> Option<FileRecord> {
        let content = fs::read_to_string(path).ok()?;
        match serde_json::from_str(&content) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(path = %path, error = %e, "Ignoring corrupt cache record");
                None
            },
        }
    }

    /// Remove expired and unreadable records
    pub fn clean(&self) -> CacheResult<CleanResult> {
        self.sweep(|record| record.map_or(true, |r| r.is_expired()))
    }

    /// Remove every record
    pub fn clear(&self) -> CacheResult<CleanResult> {
        self.sweep(|_| true)
    }

    fn sweep<F>(&self, should_remove: F) -> CacheResult<CleanResult>
    where
        F: Fn(Option<&FileRecord>) -> bool,
    {
        let mut result = CleanResult::default();

        for entry in walkdir::WalkDir::new(&self.root_path)
            .min_depth(3)
            .into_iter()
            .filter_map(Result::ok)
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(path) = Utf8Path::from_path(entry.path()) else {
                continue;
            };
            if path.extension() != Some("json") {
                continue;
            }

            let record = Self::read_record(path);
            if !should_remove(record.as_ref()) {
                continue;
            }

            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            match fs::remove_file(path) {
                Ok(()) => {
                    result.entries_removed += 1;
                    result.freed_space += size;
                },
                Err(e) => warn!(path = %path, error = %e, "Failed to remove cache record"),
            }

            // Prune the two prefix directories when they become empty
            if let Some(parent) = path.parent() {
                let _ = fs::remove_dir(parent);
                if let Some(grandparent) = parent.parent() {
                    let _ = fs::remove_dir(grandparent);
                }
            }
        }

        debug!(
            removed = result.entries_removed,
            freed = result.freed_space,
            "Swept cache directory"
        );
        Ok(result)
    }
}

impl CacheStore for FileStore {
    fn get(&self, namespace: &str, key: &str) -> Option<Value> {
        let path = self.record_path(namespace, key);
        let record = Self::read_record(&path)?;

        // Guard against blake3 prefix collisions and hand-edited files
        if record.namespace != namespace || record.key != key {
            return None;
        }

        if record.is_expired() {
            let _ = fs::remove_file(&path);
            return None;
        }

        Some(record.value)
    }

    fn set(&self, namespace: &str, key: &str, value: Value, ttl_minutes: u64) -> CacheResult<()> {
        let path = self.record_path(namespace, key);
        let now = Utc::now().timestamp();
        let record = FileRecord {
            namespace: namespace.to_string(),
            key: key.to_string(),
            value,
            stored_at: now,
            expires_at: now + (ttl_minutes as i64) * 60,
        };

        let parent = path.parent().unwrap_or(&self.root_path);
        fs::create_dir_all(parent)
            .map_err(|e| QuayError::io("Failed to create cache record directory".to_string(), e))?;

        let content = serde_json::to_vec(&record)
            .map_err(|e| QuayError::cache(format!("Failed to encode cache record {}", key), e))?;

        // Each writer gets its own temp file; the rename makes the record visible whole
        let mut tmp = NamedTempFile::new_in(parent)
            .map_err(|e| QuayError::io(format!("Failed to create temp file in {}", parent), e))?;
        tmp.write_all(&content)
            .map_err(|e| QuayError::io(format!("Failed to write cache record {}", path), e))?;
        tmp.persist(&path)
            .map_err(|e| QuayError::io(format!("Failed to move cache record into {}", path), e.error))?;

        Ok(())
    }
}

/// Result of a clean or clear operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanResult {
    /// Number of records removed
    pub entries_removed: usize,
    /// Bytes freed
    pub freed_space: u64,
}

impl CleanResult {
    /// Format freed space in human-readable format
    pub fn format_freed_space(&self) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = self.freed_space as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", self.freed_space, UNITS[unit_index])
        } else {
            format!("{:.1} {}", size, UNITS[unit_index])
        }
    }
}
