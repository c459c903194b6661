//! Hash-addressed shard fetching with auth-aware caching

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use quay_cache::CacheStoreExt;
use quay_core::error::QuayError;

use crate::api::ShardFile;
use crate::view::FileDescriptor;
use crate::{RegistryResult, SHARD_CACHE_MINUTES, SHARD_CACHE_NAMESPACE};

use super::{join_url, RegistryFetcher};

/// A shard as kept in the persistent cache
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShardRecord {
    /// Shard body exactly as fetched
    pub content: Value,
    /// Hash the shard was requested under
    pub content_hash: String,
}

impl RegistryFetcher {
    /// Fetch one shard.
    ///
    /// Anonymous requests are served from the persistent cache when the
    /// cached hash matches `file.hash`, and written through otherwise.
    /// Authenticated requests never read or write the cache.
    pub async fn fetch_shard(&self, registry: &Url, file: &FileDescriptor) -> RegistryResult<ShardFile> {
        let url = join_url(registry, &file.file_name())?;
        let options = self.request_options(registry.as_str());

        if options.is_authenticated() {
            debug!(url = %url, "Authenticated shard fetch, bypassing cache");
            let response = self.http.get_json::<ShardFile>(url.as_str(), &options).await?;
            return Ok(response.body);
        }

        // Keyed by template, not file name, so a republished shard is detectable
        let cache_key = format!("{}{}", registry, file.key);

        if let Some(record) = self
            .store
            .get_as::<ShardRecord>(SHARD_CACHE_NAMESPACE, &cache_key)
        {
            if record.content_hash == file.hash {
                match serde_json::from_value::<ShardFile>(record.content) {
                    Ok(shard) => {
                        debug!(key = %cache_key, "Shard cache hit");
                        return Ok(shard);
                    },
                    Err(e) => warn!(key = %cache_key, error = %e, "Cached shard is unreadable"),
                }
            } else {
                debug!(
                    key = %cache_key,
                    cached = %record.content_hash,
                    wanted = %file.hash,
                    "Shard republished, refetching"
                );
            }
        }

        let response = self.http.get_json::<Value>(url.as_str(), &options).await?;
        let shard = serde_json::from_value::<ShardFile>(response.body.clone()).map_err(|e| {
            QuayError::JsonParse {
                url: url.to_string(),
                message: e.to_string(),
            }
        })?;

        let record = ShardRecord {
            content: response.body,
            content_hash: file.hash.clone(),
        };
        if let Err(e) = self
            .store
            .set_as(SHARD_CACHE_NAMESPACE, &cache_key, &record, SHARD_CACHE_MINUTES)
        {
            warn!(key = %cache_key, error = %e, "Failed to write shard to cache");
        }

        Ok(shard)
    }
}
