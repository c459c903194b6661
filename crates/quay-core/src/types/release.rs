//! Release records.
//!
//! A [`ReleaseResult`] is what a registry lookup hands back to callers: the
//! package name, its releases in registry order, and optional homepage and
//! source URL.

use serde::{Deserialize, Serialize};

/// A single published version of a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    /// Canonical version (leading `v` stripped)
    pub version: String,
    /// Version string exactly as published, usable as a checkout reference
    pub git_ref: String,
    /// Release timestamp as published by the registry, unparsed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_timestamp: Option<String>,
}

/// Releases and auxiliary metadata for one package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseResult {
    /// Package name as requested
    pub name: String,
    /// Releases in registry iteration order; empty means "exists, no versions"
    pub releases: Vec<Release>,
    /// Project homepage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    /// Source repository URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

impl Release {
    /// Create a release whose canonical version equals its reference
    pub fn new(version: impl Into<String>) -> Self {
        let version = version.into();
        Self {
            git_ref: version.clone(),
            version,
            release_timestamp: None,
        }
    }
}

impl ReleaseResult {
    /// Create an empty result for a package
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            releases: Vec::new(),
            homepage: None,
            source_url: None,
        }
    }

    /// Canonical version strings in registry order
    pub fn versions(&self) -> impl Iterator<Item = &str> {
        self.releases.iter().map(|release| release.version.as_str())
    }

    /// Whether the package has no published versions
    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }
}
