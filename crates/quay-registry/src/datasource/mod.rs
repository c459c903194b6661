//! Multi-registry release lookup
//!
//! [`PackagistDatasource`] is the entry point of the crate. It tries each
//! configured registry in order and returns the first one that knows the
//! package. The default public registry is queried through its dedicated
//! per-package endpoint; every other registry goes through the shared
//! [`RegistryCache`] and layout-priority [`locate`].
//!
//! Failures against a single registry are soft and only logged. The one
//! exception is a transport or server failure against the default registry,
//! which surfaces as [`QuayError::ServiceUnavailable`].

use std::sync::Arc;

use tracing::{debug, error, warn};
use url::Url;

use quay_cache::{CacheStore, CacheStoreExt, MemoryStore};
use quay_core::error::QuayError;
use quay_core::types::{CredentialLookup, NoCredentials, ReleaseResult};
use quay_core::utils::normalize_registry_url;

use crate::api::{PackageEndpointResponse, ShardFile};
use crate::cache::RegistryCache;
use crate::fetch::RegistryFetcher;
use crate::http::{FailureClass, HttpClient, HttpConfig, HttpError};
use crate::lookup::{locate, Located};
use crate::normalize::normalize_releases;
use crate::template::{Placeholder, Template};
use crate::{
    RegistryResult, DEFAULT_REGISTRY_CACHE_MINUTES, DEFAULT_REGISTRY_CACHE_NAMESPACE,
    DEFAULT_REGISTRY_PACKAGE_URL, DEFAULT_REGISTRY_URL,
};

/// Arguments of [`PackagistDatasource::get_releases`]
#[derive(Debug, Clone, Default)]
pub struct GetReleasesConfig {
    /// Package to look up, e.g. `acme/widgets`
    pub package_name: String,
    /// Registries to try in order; empty means the default registry
    pub registry_urls: Vec<String>,
}

impl GetReleasesConfig {
    pub fn new(package_name: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            registry_urls: Vec::new(),
        }
    }

    /// Add a registry to try after the ones already configured
    pub fn registry(mut self, url: impl Into<String>) -> Self {
        self.registry_urls.push(url.into());
        self
    }
}

/// Builder for [`PackagistDatasource`]
#[derive(Default)]
pub struct DatasourceBuilder {
    http: Option<HttpClient>,
    http_config: Option<HttpConfig>,
    store: Option<Arc<dyn CacheStore>>,
    credentials: Option<Arc<dyn CredentialLookup>>,
    default_registry: Option<String>,
    package_url: Option<String>,
}

impl DatasourceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an existing transport
    pub fn http(mut self, http: HttpClient) -> Self {
        self.http = Some(http);
        self
    }

    /// Build the transport from this configuration
    pub fn http_config(mut self, config: HttpConfig) -> Self {
        self.http_config = Some(config);
        self
    }

    /// Persistent cache for shards and default-registry lookups
    pub fn store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Credential lookup consulted for every request
    pub fn credentials(mut self, credentials: Arc<dyn CredentialLookup>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Override the default registry URL
    pub fn default_registry(mut self, url: impl Into<String>) -> Self {
        self.default_registry = Some(url.into());
        self
    }

    /// Override the default registry's per-package endpoint template
    pub fn package_url(mut self, template: impl Into<String>) -> Self {
        self.package_url = Some(template.into());
        self
    }

    pub fn build(self) -> RegistryResult<PackagistDatasource> {
        let http = match (self.http, self.http_config) {
            (Some(http), _) => http,
            (None, Some(config)) => HttpClient::with_config(config)?,
            (None, None) => HttpClient::new()?,
        };
        let store: Arc<dyn CacheStore> = match self.store {
            Some(store) => store,
            None => Arc::new(MemoryStore::new()),
        };
        let credentials: Arc<dyn CredentialLookup> = match self.credentials {
            Some(credentials) => credentials,
            None => Arc::new(NoCredentials),
        };

        let default_registry = normalize_registry_url(
            self.default_registry
                .as_deref()
                .unwrap_or(DEFAULT_REGISTRY_URL),
        )?;
        let package_url = Template::new(
            self.package_url
                .unwrap_or_else(|| DEFAULT_REGISTRY_PACKAGE_URL.to_string()),
        );

        Ok(PackagistDatasource {
            inner: Arc::new(Inner {
                fetcher: Arc::new(RegistryFetcher::new(http, store, credentials)),
                registries: RegistryCache::new(),
                default_registry,
                package_url,
            }),
        })
    }
}

struct Inner {
    fetcher: Arc<RegistryFetcher>,
    registries: RegistryCache,
    default_registry: Url,
    package_url: Template,
}

/// Release lookup across one or more registries.
///
/// Cloning is cheap; clones share the registry resolution cache, so every
/// registry is assembled at most once per datasource.
#[derive(Clone)]
pub struct PackagistDatasource {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for PackagistDatasource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackagistDatasource")
            .field("default_registry", &self.inner.default_registry.as_str())
            .field("registries", &self.inner.registries.len())
            .finish()
    }
}

impl PackagistDatasource {
    /// Datasource with default settings
    pub fn new() -> RegistryResult<Self> {
        DatasourceBuilder::new().build()
    }

    pub fn builder() -> DatasourceBuilder {
        DatasourceBuilder::new()
    }

    /// The registry queried through the per-package fast path
    pub fn default_registry(&self) -> &Url {
        &self.inner.default_registry
    }

    /// Registry resolution cache shared by all clones
    pub fn registries(&self) -> &RegistryCache {
        &self.inner.registries
    }

    /// Look the package up in each registry in turn.
    ///
    /// Returns `Ok(None)` when no registry knows the package. Only a
    /// retryable failure of the default registry is returned as an error.
    pub async fn get_releases(&self, config: &GetReleasesConfig) -> RegistryResult<Option<ReleaseResult>> {
        let defaults;
        let registry_urls: &[String] = if config.registry_urls.is_empty() {
            defaults = [self.inner.default_registry.to_string()];
            &defaults
        } else {
            &config.registry_urls
        };

        for registry_url in registry_urls {
            match self.lookup(registry_url, &config.package_name).await {
                Ok(Some(result)) => return Ok(Some(result)),
                Ok(None) => {
                    debug!(registry = %registry_url, package = %config.package_name, "Package not found");
                },
                Err(e) if e.is_retryable() => return Err(e),
                Err(e) => {
                    warn!(registry = %registry_url, package = %config.package_name, error = %e, "Registry lookup failed");
                },
            }
        }

        Ok(None)
    }

    /// Look a package up in one registry
    pub async fn lookup(&self, registry_url: &str, name: &str) -> RegistryResult<Option<ReleaseResult>> {
        let registry = match normalize_registry_url(registry_url) {
            Ok(url) => url,
            Err(e) => {
                warn!(registry = registry_url, error = %e, "Skipping invalid registry URL");
                return Ok(None);
            },
        };

        if registry == self.inner.default_registry {
            return self.lookup_default_registry(name).await;
        }

        let fetcher = Arc::clone(&self.inner.fetcher);
        let assemble_url = registry.clone();
        let Some(view) = self
            .inner
            .registries
            .resolve(registry.as_str(), move || fetcher.assemble(assemble_url))
            .await
        else {
            return Ok(None);
        };

        match locate(&view, &registry, name) {
            Some((strategy, Located::Release(result))) => {
                debug!(registry = %registry, package = name, ?strategy, "Package located");
                Ok(Some(result))
            },
            Some((strategy, Located::Fetch(url))) => {
                debug!(registry = %registry, package = name, ?strategy, url = %url, "Fetching provider file");
                self.fetch_provider_package(&registry, &url, name).await
            },
            None => Ok(None),
        }
    }

    /// Per-package provider file, always fetched fresh with the registry's credentials
    async fn fetch_provider_package(
        &self,
        registry: &Url,
        url: &Url,
        name: &str,
    ) -> RegistryResult<Option<ReleaseResult>> {
        let fetcher = &self.inner.fetcher;
        let options = fetcher.request_options(registry.as_str());

        match fetcher.http().get_json::<ShardFile>(url.as_str(), &options).await {
            Ok(response) => {
                let result = match response.body.packages.get(name) {
                    Some(versions) => normalize_releases(name, versions),
                    None => ReleaseResult::empty(name),
                };
                Ok(Some(result))
            },
            Err(err) => self.handle_lookup_error(err, false),
        }
    }

    /// Dedicated endpoint of the default registry, with a short-lived cache
    async fn lookup_default_registry(&self, name: &str) -> RegistryResult<Option<ReleaseResult>> {
        let fetcher = &self.inner.fetcher;
        let url = self.inner.package_url.expand(&[(Placeholder::Package, name)]);
        let options = fetcher.request_options(&url);
        let cacheable = !options.is_authenticated();

        if cacheable {
            if let Some(cached) = fetcher
                .store()
                .get_as::<ReleaseResult>(DEFAULT_REGISTRY_CACHE_NAMESPACE, name)
            {
                debug!(package = name, "Default registry cache hit");
                return Ok(Some(cached));
            }
        }

        let response = match fetcher
            .http()
            .get_json::<PackageEndpointResponse>(&url, &options)
            .await
        {
            Ok(response) => response,
            Err(err) => return self.handle_lookup_error(err, true),
        };

        let Some(package) = response.body.package else {
            return Ok(None);
        };
        let result = normalize_releases(name, &package.versions);

        if cacheable {
            if let Err(e) = fetcher.store().set_as(
                DEFAULT_REGISTRY_CACHE_NAMESPACE,
                name,
                &result,
                DEFAULT_REGISTRY_CACHE_MINUTES,
            ) {
                warn!(package = name, error = %e, "Failed to cache default registry lookup");
            }
        }

        Ok(Some(result))
    }

    /// Apply the lookup error policy.
    ///
    /// Transport and server failures escalate only for the default registry,
    /// recognized either by the fast path or by the origin of the failed URL.
    fn handle_lookup_error(&self, err: HttpError, fast_path: bool) -> RegistryResult<Option<ReleaseResult>> {
        match err.classify() {
            FailureClass::NotFound => {
                debug!(url = %err.url, "Not found");
                Ok(None)
            },
            FailureClass::Unauthorized => {
                warn!(url = %err.url, status = ?err.status, "Access denied");
                Ok(None)
            },
            FailureClass::Transport | FailureClass::ServerError
                if fast_path || err.is_same_origin(&self.inner.default_registry) =>
            {
                Err(QuayError::ServiceUnavailable {
                    host: err
                        .host
                        .clone()
                        .unwrap_or_else(|| self.inner.default_registry.to_string()),
                    message: err.to_string(),
                })
            },
            FailureClass::Transport | FailureClass::ServerError => {
                warn!(url = %err.url, error = %err, "Registry request failed");
                Ok(None)
            },
            FailureClass::Unrecognized => {
                error!(url = %err.url, error = %err, "Unexpected error during package lookup");
                Ok(None)
            },
        }
    }
}

#[cfg(test)]
mod tests;
