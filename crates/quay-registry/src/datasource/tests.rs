//! Unit tests for multi-registry lookup

use super::*;
use crate::test_support::{test_http, RecordingStore, StaticCredentials};

use quay_core::types::HostCredentials;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn private_datasource(store: Arc<RecordingStore>) -> PackagistDatasource {
    DatasourceBuilder::new()
        .http(test_http())
        .store(store)
        .build()
        .unwrap()
}

/// Datasource that treats `server` as the default registry
fn default_registry_datasource(
    server: &MockServer,
    store: Arc<RecordingStore>,
    credentials: HostCredentials,
) -> PackagistDatasource {
    DatasourceBuilder::new()
        .http(test_http())
        .store(store)
        .credentials(Arc::new(StaticCredentials(credentials)))
        .default_registry(server.uri())
        .package_url(format!("{}/packages/%package%.json", server.uri()))
        .build()
        .unwrap()
}

fn package_endpoint_body() -> serde_json::Value {
    json!({
        "package": {
            "name": "acme/widgets",
            "versions": {
                "v2.1.0": {
                    "homepage": "https://widgets.acme.test",
                    "source": { "url": "https://git.acme.test/widgets.git", "type": "git", "reference": "abc123" },
                    "time": "2023-05-01T10:00:00+00:00"
                },
                "1.0.0": {}
            }
        }
    })
}

#[tokio::test]
async fn test_concurrent_lookups_assemble_registry_once() {
    let server = MockServer::start().await;
    let packages: serde_json::Map<String, serde_json::Value> = (0..10)
        .map(|i| (format!("acme/pkg{}", i), json!({ (format!("1.{}.0", i)): {} })))
        .collect();
    Mock::given(method("GET"))
        .and(path("/packages.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "packages": packages }))
                .set_delay(std::time::Duration::from_millis(50)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let datasource = private_datasource(RecordingStore::new());
    let mut handles = Vec::new();
    for i in 0..10 {
        let datasource = datasource.clone();
        let registry = server.uri();
        handles.push(tokio::spawn(async move {
            datasource
                .lookup(&registry, &format!("acme/pkg{}", i))
                .await
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let result = handle.await.unwrap().unwrap().unwrap();
        assert_eq!(result.releases[0].version, format!("1.{}.0", i));
    }
    assert_eq!(datasource.registries().len(), 1);
}

#[tokio::test]
async fn test_provider_lookup_is_never_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/packages.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "packages": [],
            "provider-includes": { "p/provider-latest$%hash%.json": { "sha256": "s1" } },
            "providers-url": "/p/%package%$%hash%.json"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/p/provider-latest$s1.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "providers": { "acme/widgets": { "sha256": "w1" } }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/p/acme/widgets$w1.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "packages": { "acme/widgets": { "v1.2.3": { "time": "2022-01-01" } } }
        })))
        .expect(2)
        .mount(&server)
        .await;

    let store = RecordingStore::new();
    let datasource = private_datasource(Arc::clone(&store));

    for _ in 0..2 {
        let result = datasource
            .lookup(&server.uri(), "acme/widgets")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result.releases[0].version, "1.2.3");
        assert_eq!(result.releases[0].git_ref, "v1.2.3");
    }

    // Only the shard went through the cache
    assert_eq!(store.gets(), 1);
    assert_eq!(store.sets(), 1);
}

#[tokio::test]
async fn test_provider_file_without_package_yields_no_releases() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/packages.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "providers": { "acme/widgets": { "sha256": "w1" } },
            "providers-url": "/p/%package%$%hash%.json"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/p/acme/widgets$w1.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "packages": [] })))
        .mount(&server)
        .await;

    let result = private_datasource(RecordingStore::new())
        .lookup(&server.uri(), "acme/widgets")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(result.name, "acme/widgets");
    assert!(result.is_empty());
}

#[tokio::test]
async fn test_includes_lookup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repo/packages.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "packages": [],
            "includes": { "include/all$f00d.json": { "sha1": "f00d" } }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repo/include/all$f00d.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "packages": {
                "acme/bundled": {
                    "v0.9.0": { "homepage": "https://old.acme.test" },
                    "v1.0.0": { "homepage": "https://acme.test" }
                }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = private_datasource(RecordingStore::new())
        .lookup(&format!("{}/repo", server.uri()), "acme/bundled")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(result.versions().collect::<Vec<_>>(), vec!["0.9.0", "1.0.0"]);
    assert_eq!(result.homepage.as_deref(), Some("https://acme.test"));
}

#[tokio::test]
async fn test_fast_path_absent_package() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/packages/acme/missing.json"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/packages.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "packages": [] })))
        .expect(0)
        .mount(&server)
        .await;

    let datasource =
        default_registry_datasource(&server, RecordingStore::new(), HostCredentials::default());
    let result = datasource
        .get_releases(&GetReleasesConfig::new("acme/missing"))
        .await
        .unwrap();

    assert!(result.is_none());
    assert!(datasource.registries().is_empty());
}

#[tokio::test]
async fn test_fast_path_results_are_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/packages/acme/widgets.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(package_endpoint_body()))
        .expect(1)
        .mount(&server)
        .await;

    let store = RecordingStore::new();
    let datasource =
        default_registry_datasource(&server, Arc::clone(&store), HostCredentials::default());

    let first = datasource
        .lookup(&server.uri(), "acme/widgets")
        .await
        .unwrap()
        .unwrap();
    let second = datasource
        .lookup(&format!("{}/", server.uri()), "acme/widgets")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(first.releases[0].version, "2.1.0");
    assert_eq!(first.releases[0].git_ref, "v2.1.0");
    assert_eq!(
        first.releases[0].release_timestamp.as_deref(),
        Some("2023-05-01T10:00:00+00:00")
    );
    assert_eq!(first.releases[1].version, "1.0.0");
    assert_eq!(first.source_url.as_deref(), Some("https://git.acme.test/widgets.git"));
    assert_eq!(store.sets(), 1);
}

#[tokio::test]
async fn test_fast_path_authenticated_skips_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/packages/acme/widgets.json"))
        .and(header("authorization", "Bearer t0ken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(package_endpoint_body()))
        .expect(2)
        .mount(&server)
        .await;

    let store = RecordingStore::new();
    let datasource =
        default_registry_datasource(&server, Arc::clone(&store), HostCredentials::bearer("t0ken"));

    for _ in 0..2 {
        assert!(datasource
            .lookup(&server.uri(), "acme/widgets")
            .await
            .unwrap()
            .is_some());
    }
    assert_eq!(store.interactions(), 0);
}

#[tokio::test]
async fn test_default_registry_server_error_escalates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/packages/acme/widgets.json"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let datasource =
        default_registry_datasource(&server, RecordingStore::new(), HostCredentials::default());
    let err = datasource
        .get_releases(&GetReleasesConfig::new("acme/widgets"))
        .await
        .unwrap_err();

    assert!(matches!(err, QuayError::ServiceUnavailable { .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_default_registry_origin_escalates_provider_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/mirror/packages.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "providers": { "acme/widgets": { "sha256": "w1" } },
            "providers-url": "/p/%package%$%hash%.json"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/p/acme/widgets$w1.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let datasource =
        default_registry_datasource(&server, RecordingStore::new(), HostCredentials::default());
    let err = datasource
        .lookup(&format!("{}/mirror", server.uri()), "acme/widgets")
        .await
        .unwrap_err();

    assert!(matches!(err, QuayError::ServiceUnavailable { .. }));
}

#[tokio::test]
async fn test_private_registry_failures_are_soft() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/packages.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "providers": { "acme/widgets": { "sha256": "w1" } },
            "providers-url": "/p/%package%$%hash%.json"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/p/acme/widgets$w1.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = private_datasource(RecordingStore::new())
        .get_releases(&GetReleasesConfig::new("acme/widgets").registry(server.uri()))
        .await
        .unwrap();

    assert!(result.is_none());
}

#[tokio::test]
async fn test_falls_back_to_next_registry() {
    let broken = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/packages.json"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&broken)
        .await;

    let working = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/packages.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "packages": { "acme/widgets": { "v3.0.0": {}, "v3.1.0": {} } }
        })))
        .expect(1)
        .mount(&working)
        .await;

    let datasource = private_datasource(RecordingStore::new());
    let config = GetReleasesConfig::new("acme/widgets")
        .registry("not a url")
        .registry(broken.uri())
        .registry(working.uri());

    let result = datasource.get_releases(&config).await.unwrap().unwrap();
    assert_eq!(result.versions().collect::<Vec<_>>(), vec!["3.0.0", "3.1.0"]);

    // The broken registry stays failed and is not fetched again
    let again = datasource.get_releases(&config).await.unwrap().unwrap();
    assert_eq!(again, result);
}

#[tokio::test]
async fn test_unknown_package_across_registries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/packages.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "packages": { "acme/other": { "1.0.0": {} } }
        })))
        .mount(&server)
        .await;

    let result = private_datasource(RecordingStore::new())
        .get_releases(&GetReleasesConfig::new("acme/widgets").registry(server.uri()))
        .await
        .unwrap();
    assert!(result.is_none());
}

/// Credentials scoped to a URL prefix, like a `match-host` URL rule
struct PrefixCredentials {
    prefix: String,
    credentials: HostCredentials,
}

impl CredentialLookup for PrefixCredentials {
    fn find(&self, _host_type: &str, url: &str) -> HostCredentials {
        if url.starts_with(&self.prefix) {
            self.credentials.clone()
        } else {
            HostCredentials::default()
        }
    }
}

#[tokio::test]
async fn test_provider_file_uses_registry_credentials() {
    let server = MockServer::start().await;
    let registry = format!("{}/private/", server.uri());

    Mock::given(method("GET"))
        .and(path("/private/packages.json"))
        .and(header("Authorization", "Basic dXNlcjpzZWNyZXQ="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "providers": { "acme/widgets": { "sha256": "w1" } },
            "providers-url": "/p/%package%$%hash%.json"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/p/acme/widgets$w1.json"))
        .and(header("Authorization", "Basic dXNlcjpzZWNyZXQ="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "packages": { "acme/widgets": { "v1.0.0": {} } }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let datasource = DatasourceBuilder::new()
        .http(test_http())
        .store(RecordingStore::new())
        .credentials(Arc::new(PrefixCredentials {
            prefix: registry.clone(),
            credentials: HostCredentials::basic("user", "secret"),
        }))
        .build()
        .unwrap();

    let result = datasource
        .lookup(&registry, "acme/widgets")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(result.versions().collect::<Vec<_>>(), vec!["1.0.0"]);
}

#[test]
fn test_builder_rejects_invalid_default_registry() {
    let result = DatasourceBuilder::new()
        .http(test_http())
        .default_registry("not a url")
        .build();
    assert!(matches!(result, Err(QuayError::InvalidUrl { .. })));
}
