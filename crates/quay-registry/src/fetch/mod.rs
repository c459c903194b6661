//! Root document and shard fetching
//!
//! [`RegistryFetcher`] owns the transport, the persistent cache and the
//! credential lookup. It turns a registry URL into a fully assembled
//! [`RegistryView`]: root document first, then provider shards with bounded
//! concurrency, then includes files one after another.

use std::sync::Arc;

use tracing::{debug, warn};
use url::Url;

use quay_cache::CacheStore;
use quay_core::error::QuayError;
use quay_core::types::CredentialLookup;

use crate::http::{HttpClient, RequestOptions};
use crate::scheduler::join_bounded;
use crate::view::RegistryView;
use crate::{RegistryResult, HOST_TYPE, MAX_CONCURRENT_SHARD_FETCHES};

mod root;
mod shard;

pub use shard::ShardRecord;

/// Fetches and assembles registry metadata
pub struct RegistryFetcher {
    http: HttpClient,
    store: Arc<dyn CacheStore>,
    credentials: Arc<dyn CredentialLookup>,
}

impl std::fmt::Debug for RegistryFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryFetcher")
            .field("http", &self.http)
            .finish_non_exhaustive()
    }
}

impl RegistryFetcher {
    /// Create a fetcher
    pub fn new(
        http: HttpClient,
        store: Arc<dyn CacheStore>,
        credentials: Arc<dyn CredentialLookup>,
    ) -> Self {
        Self {
            http,
            store,
            credentials,
        }
    }

    /// Underlying transport
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Persistent cache store
    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// Request options carrying the credentials configured for `url`
    pub fn request_options(&self, url: &str) -> RequestOptions {
        RequestOptions::from_credentials(&self.credentials.find(HOST_TYPE, url))
    }

    /// Fetch the root document and every shard it references.
    ///
    /// Any failure makes the whole registry unusable for this run; the
    /// reason is logged and `None` returned.
    pub async fn assemble(self: Arc<Self>, registry: Url) -> Option<RegistryView> {
        let mut view = self.fetch_root(&registry).await?;

        let shard_files = view.shard_files.clone();
        let shards = join_bounded(shard_files, MAX_CONCURRENT_SHARD_FETCHES, |file| {
            let fetcher = Arc::clone(&self);
            let registry = registry.clone();
            async move { fetcher.fetch_shard(&registry, &file).await }
        })
        .await;

        let shards = match shards {
            Ok(shards) => shards,
            Err(e) => {
                warn!(registry = %registry, error = %e, "Failed to fetch provider shards");
                return None;
            },
        };

        // Shards are merged in listing order, so later shards win collisions
        for shard in &shards {
            view.merge_provider_shard(shard);
        }

        for file in view.includes_files.clone() {
            match self.fetch_shard(&registry, &file).await {
                Ok(shard) => view.merge_includes(&shard),
                Err(e) => {
                    warn!(registry = %registry, key = %file.key, error = %e, "Failed to fetch includes file");
                    return None;
                },
            }
        }

        debug!(
            registry = %registry,
            shards = shards.len(),
            includes = view.includes_files.len(),
            packages = view.known_packages(),
            "Registry view assembled"
        );
        Some(view)
    }
}

/// Resolve a file name or URL template expansion against the registry
pub(crate) fn join_url(registry: &Url, file_name: &str) -> RegistryResult<Url> {
    registry.join(file_name).map_err(|e| QuayError::InvalidUrl {
        url: format!("{}{}", registry, file_name),
        reason: e.to_string(),
    })
}
