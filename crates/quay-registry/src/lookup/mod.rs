//! Layout-priority package lookup against an assembled view
//!
//! A package can be published through any of the three layouts a registry
//! supports. They are probed in a fixed order and the first one that knows
//! the package wins:
//!
//! 1. [`LookupStrategy::Flat`]: `packages` embedded in the root document
//! 2. [`LookupStrategy::Includes`]: packages from bundled includes files
//! 3. [`LookupStrategy::Provider`]: a per-package provider file addressed by
//!    `providers-url`
//!
//! The first two resolve locally. The provider layout only yields the URL
//! that still has to be fetched.

use tracing::warn;
use url::Url;

use quay_core::types::ReleaseResult;

use crate::fetch::join_url;
use crate::normalize::normalize_releases;
use crate::template::Placeholder;
use crate::view::RegistryView;

/// One way a registry can publish a package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupStrategy {
    Flat,
    Includes,
    Provider,
}

/// Outcome of a successful probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Located {
    /// Releases available without further requests
    Release(ReleaseResult),
    /// Provider file that holds the package
    Fetch(Url),
}

impl LookupStrategy {
    /// Probe order
    pub const PRIORITY: [LookupStrategy; 3] = [
        LookupStrategy::Flat,
        LookupStrategy::Includes,
        LookupStrategy::Provider,
    ];

    /// Try this strategy alone
    pub fn probe(self, view: &RegistryView, registry: &Url, name: &str) -> Option<Located> {
        match self {
            LookupStrategy::Flat => view
                .flat_package(name)
                .map(|versions| Located::Release(normalize_releases(name, versions))),
            LookupStrategy::Includes => view
                .includes_packages
                .get(name)
                .cloned()
                .map(Located::Release),
            LookupStrategy::Provider => provider_url(view, registry, name).map(Located::Fetch),
        }
    }
}

/// Probe every strategy in priority order, stopping at the first hit
pub fn locate(view: &RegistryView, registry: &Url, name: &str) -> Option<(LookupStrategy, Located)> {
    LookupStrategy::PRIORITY
        .iter()
        .find_map(|strategy| strategy.probe(view, registry, name).map(|found| (*strategy, found)))
}

fn provider_url(view: &RegistryView, registry: &Url, name: &str) -> Option<Url> {
    let hash = view.provider_package_hashes.get(name)?;

    let Some(template) = &view.providers_url else {
        warn!(registry = %registry, package = name, "Provider hash listed but registry has no providers-url");
        return None;
    };

    let file_name = template.expand(&[(Placeholder::Package, name), (Placeholder::Hash, hash)]);
    match join_url(registry, &file_name) {
        Ok(url) => Some(url),
        Err(e) => {
            warn!(registry = %registry, package = name, error = %e, "Invalid provider URL");
            None
        },
    }
}
