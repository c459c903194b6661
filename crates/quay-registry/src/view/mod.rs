//! The assembled per-registry view
//!
//! A [`RegistryView`] starts as a projection of the root document and is
//! completed by merging provider shards and normalized includes. Once
//! assembled it is shared read-only behind an `Arc`.

use indexmap::IndexMap;
use tracing::warn;

use quay_core::types::ReleaseResult;

use crate::api::{RawVersionMap, RootDocument, ShardFile};
use crate::normalize::normalize_releases;
use crate::template::Template;

/// A hash-addressed file the registry publishes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    /// File name template, usually containing `%hash%`
    pub key: Template,
    /// Current content hash
    pub hash: String,
}

impl FileDescriptor {
    pub fn new(key: impl Into<Template>, hash: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            hash: hash.into(),
        }
    }

    /// Concrete file name for the current hash
    pub fn file_name(&self) -> String {
        self.key.with_hash(&self.hash)
    }
}

/// Everything known about one registry
#[derive(Debug, Clone, Default)]
pub struct RegistryView {
    /// Flat layout packages, if the root document had any
    pub packages: Option<IndexMap<String, RawVersionMap>>,
    /// Template for per-package provider files
    pub providers_url: Option<Template>,
    /// Package name to provider file hash
    pub provider_package_hashes: IndexMap<String, String>,
    /// Provider shards listed under `provider-includes`
    pub shard_files: Vec<FileDescriptor>,
    /// Bundled files listed under `includes`
    pub includes_files: Vec<FileDescriptor>,
    /// Packages from bundled files, already normalized
    pub includes_packages: IndexMap<String, ReleaseResult>,
}

impl RegistryView {
    /// Project a root document into a partially filled view
    pub fn from_root(root: RootDocument) -> Self {
        let packages = if root.packages.is_empty() {
            None
        } else {
            Some(root.packages.0.into_iter().collect())
        };

        let provider_package_hashes = root
            .providers
            .iter()
            .filter_map(|(name, hash_ref)| {
                hash_ref.hash().map(|hash| (name.clone(), hash.to_string()))
            })
            .collect();

        let shard_files = root
            .provider_includes
            .iter()
            .filter_map(|(key, hash_ref)| match hash_ref.hash() {
                Some(hash) => Some(FileDescriptor::new(key.as_str(), hash)),
                None => {
                    warn!(key = %key, "Skipping provider include without a hash");
                    None
                },
            })
            .collect();

        let includes_files = root
            .includes
            .iter()
            .filter_map(|(name, hash_ref)| match hash_ref.hash() {
                Some(hash) => Some(FileDescriptor {
                    key: Template::from_hashed_name(name, hash),
                    hash: hash.to_string(),
                }),
                None => {
                    warn!(name = %name, "Skipping include without a hash");
                    None
                },
            })
            .collect();

        Self {
            packages,
            providers_url: root.providers_url.map(Template::new),
            provider_package_hashes,
            shard_files,
            includes_files,
            includes_packages: IndexMap::new(),
        }
    }

    /// Merge a provider shard; later shards overwrite earlier ones
    pub fn merge_provider_shard(&mut self, shard: &ShardFile) {
        for (name, hash_ref) in shard.providers.iter() {
            if let Some(hash) = hash_ref.hash() {
                self.provider_package_hashes
                    .insert(name.clone(), hash.to_string());
            }
        }
    }

    /// Normalize and merge the packages of an includes file
    pub fn merge_includes(&mut self, shard: &ShardFile) {
        for (name, versions) in shard.packages.iter() {
            self.includes_packages
                .insert(name.clone(), normalize_releases(name, versions));
        }
    }

    /// Flat layout entry for a package
    pub fn flat_package(&self, name: &str) -> Option<&RawVersionMap> {
        self.packages.as_ref().and_then(|packages| packages.get(name))
    }

    /// Number of package names reachable through any layout
    pub fn known_packages(&self) -> usize {
        self.packages.as_ref().map_or(0, IndexMap::len)
            + self.includes_packages.len()
            + self.provider_package_hashes.len()
    }
}

#[cfg(test)]
mod tests;
