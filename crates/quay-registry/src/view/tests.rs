//! Unit tests for view projection and merging

use super::*;

fn root(json: serde_json::Value) -> RootDocument {
    serde_json::from_value(json).unwrap()
}

fn shard(json: serde_json::Value) -> ShardFile {
    serde_json::from_value(json).unwrap()
}

#[test]
fn test_from_root_projects_every_layout() {
    let view = RegistryView::from_root(root(serde_json::json!({
        "packages": { "acme/flat": { "1.0.0": {} } },
        "includes": { "include/all$3b2a.json": { "sha1": "3b2a" } },
        "provider-includes": {
            "p/provider-2022$%hash%.json": { "sha256": "aa" },
            "p/provider-2023$%hash%.json": { "sha256": "bb" }
        },
        "providers": { "acme/direct": { "sha256": "cc" } },
        "providers-url": "/p/%package%$%hash%.json"
    })));

    assert!(view.flat_package("acme/flat").is_some());
    assert_eq!(view.providers_url.as_ref().unwrap().as_str(), "/p/%package%$%hash%.json");
    assert_eq!(view.provider_package_hashes["acme/direct"], "cc");

    assert_eq!(
        view.shard_files,
        vec![
            FileDescriptor::new("p/provider-2022$%hash%.json", "aa"),
            FileDescriptor::new("p/provider-2023$%hash%.json", "bb"),
        ]
    );

    assert_eq!(view.includes_files.len(), 1);
    assert_eq!(view.includes_files[0].key.as_str(), "include/all$%hash%.json");
    assert_eq!(view.includes_files[0].file_name(), "include/all$3b2a.json");
    assert!(view.includes_packages.is_empty());
}

#[test]
fn test_empty_packages_is_none() {
    let view = RegistryView::from_root(root(serde_json::json!({ "packages": [] })));
    assert!(view.packages.is_none());
    assert!(view.flat_package("acme/flat").is_none());
    assert_eq!(view.known_packages(), 0);
}

#[test]
fn test_entries_without_hash_are_skipped() {
    let view = RegistryView::from_root(root(serde_json::json!({
        "provider-includes": { "p/broken$%hash%.json": {} },
        "providers": { "acme/broken": {} }
    })));

    assert!(view.shard_files.is_empty());
    assert!(view.provider_package_hashes.is_empty());
}

#[test]
fn test_provider_shard_merge_is_last_write_wins() {
    let mut view = RegistryView::default();
    view.merge_provider_shard(&shard(serde_json::json!({
        "providers": {
            "acme/a": { "sha256": "first" },
            "acme/b": { "sha256": "b1" }
        }
    })));
    view.merge_provider_shard(&shard(serde_json::json!({
        "providers": { "acme/a": { "sha256": "second" } }
    })));

    assert_eq!(view.provider_package_hashes["acme/a"], "second");
    assert_eq!(view.provider_package_hashes["acme/b"], "b1");
}

#[test]
fn test_includes_merge_normalizes() {
    let mut view = RegistryView::default();
    view.merge_includes(&shard(serde_json::json!({
        "packages": {
            "acme/bundled": {
                "v1.0.0": { "homepage": "https://acme.test" }
            }
        }
    })));

    let result = &view.includes_packages["acme/bundled"];
    assert_eq!(result.name, "acme/bundled");
    assert_eq!(result.releases[0].version, "1.0.0");
    assert_eq!(result.releases[0].git_ref, "v1.0.0");
    assert_eq!(result.homepage.as_deref(), Some("https://acme.test"));
    assert_eq!(view.known_packages(), 1);
}
