//! Composer-style registry metadata resolution for Quay
//!
//! This crate enumerates the releases of a package published on a registry
//! that speaks the `packages.json` protocol. A registry may publish its
//! metadata in three layouts, and this crate handles all of them:
//!
//! - flat `packages` embedded in the root document
//! - bundled `includes` files, fetched and normalized eagerly
//! - hash-addressed `provider-includes` shards pointing at per-package files
//!
//! Root fetch and shard fan-out happen once per registry and are shared by
//! every lookup against it. Anonymous shard fetches go through a persistent
//! [`quay_cache::CacheStore`]; authenticated ones never touch it.

pub mod api;
pub mod cache;
pub mod datasource;
pub mod fetch;
pub mod http;
pub mod lookup;
pub mod normalize;
pub mod scheduler;
pub mod template;
pub mod view;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export main types
pub use api::{HashRef, LenientMap, RawVersion, RawVersionMap, RootDocument, ShardFile};
pub use cache::{EntryState, RegistryCache};
pub use datasource::{DatasourceBuilder, GetReleasesConfig, PackagistDatasource};
pub use http::{HttpClient, HttpConfig, HttpError, RequestOptions, RetryConfig, TransportCode};
pub use lookup::{locate, Located, LookupStrategy};
pub use normalize::{canonical_version, normalize_releases};
pub use template::{Placeholder, Template};
pub use view::{FileDescriptor, RegistryView};

use quay_core::error::QuayError;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, QuayError>;

/// Host type used when asking the credential lookup for registry auth
pub const HOST_TYPE: &str = "packagist";

/// The well-known public registry
pub const DEFAULT_REGISTRY_URL: &str = "https://packagist.org";

/// Per-package endpoint of the default registry
pub const DEFAULT_REGISTRY_PACKAGE_URL: &str = "https://packagist.org/packages/%package%.json";

/// Cache namespace for anonymous shard files
pub const SHARD_CACHE_NAMESPACE: &str = "datasource-packagist-files";

/// Shard files are kept for a day
pub const SHARD_CACHE_MINUTES: u64 = 24 * 60;

/// Cache namespace for default-registry package lookups
pub const DEFAULT_REGISTRY_CACHE_NAMESPACE: &str = "datasource-packagist-org";

/// Default-registry package lookups are kept for ten minutes
pub const DEFAULT_REGISTRY_CACHE_MINUTES: u64 = 10;

/// Ceiling on simultaneous provider shard fetches
pub const MAX_CONCURRENT_SHARD_FETCHES: usize = 5;
