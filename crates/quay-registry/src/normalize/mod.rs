//! Raw version maps to release records

use quay_core::types::{Release, ReleaseResult};

use crate::api::RawVersionMap;

/// Strip one optional leading `v` from a published version string
pub fn canonical_version(raw: &str) -> &str {
    raw.strip_prefix('v').unwrap_or(raw)
}

/// Convert a raw version map into a [`ReleaseResult`].
///
/// Releases keep the map's document order. Homepage and source URL come
/// from the last entry that defines them. Timestamps are passed through
/// without parsing.
pub fn normalize_releases(name: &str, versions: &RawVersionMap) -> ReleaseResult {
    let mut result = ReleaseResult::empty(name);
    result.releases.reserve(versions.len());

    for (raw, entry) in versions.iter() {
        if let Some(homepage) = &entry.homepage {
            result.homepage = Some(homepage.clone());
        }
        if let Some(url) = entry.source.as_ref().and_then(|source| source.url.as_ref()) {
            result.source_url = Some(url.clone());
        }

        result.releases.push(Release {
            version: canonical_version(raw).to_string(),
            git_ref: raw.clone(),
            release_timestamp: entry.time.clone(),
        });
    }

    result
}
