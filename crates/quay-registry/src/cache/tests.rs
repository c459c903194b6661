//! Unit tests for the registry resolution cache

use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const REGISTRY: &str = "https://repo.example.com/";

fn view_with_hash(name: &str, hash: &str) -> RegistryView {
    let mut view = RegistryView::default();
    view.provider_package_hashes
        .insert(name.to_string(), hash.to_string());
    view
}

#[tokio::test]
async fn test_resolve_assembles_once() {
    let cache = RegistryCache::new();
    let calls = Arc::new(AtomicUsize::new(0));

    for _ in 0..3 {
        let calls = Arc::clone(&calls);
        let view = cache
            .resolve(REGISTRY, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Some(view_with_hash("acme/a", "h1"))
            })
            .await
            .unwrap();
        assert_eq!(view.provider_package_hashes["acme/a"], "h1");
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(matches!(cache.state(REGISTRY), Some(EntryState::Resolved(_))));
}

#[tokio::test]
async fn test_concurrent_callers_share_one_assembly() {
    let cache = Arc::new(RegistryCache::new());
    let calls = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..10 {
        let cache = Arc::clone(&cache);
        let calls = Arc::clone(&calls);
        handles.push(tokio::spawn(async move {
            cache
                .resolve(REGISTRY, move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Some(view_with_hash("acme/a", "h1"))
                })
                .await
        }));
    }

    let mut views = Vec::new();
    for handle in handles {
        views.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(views.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
}

#[tokio::test]
async fn test_failure_is_permanent() {
    let cache = RegistryCache::new();

    let first = cache.resolve(REGISTRY, || async { None }).await;
    assert!(first.is_none());
    assert!(matches!(cache.state(REGISTRY), Some(EntryState::Failed)));

    // A later caller does not retry the assembly
    let second = cache
        .resolve(REGISTRY, || async { Some(RegistryView::default()) })
        .await;
    assert!(second.is_none());
}

#[tokio::test]
async fn test_registries_are_independent() {
    let cache = RegistryCache::new();

    let a = cache
        .resolve("https://a.example.com/", || async { Some(view_with_hash("acme/a", "ha")) })
        .await;
    let b = cache
        .resolve("https://b.example.com/", || async { None })
        .await;

    assert!(a.is_some());
    assert!(b.is_none());
    assert_eq!(cache.len(), 2);
}

#[tokio::test]
async fn test_abandoned_caller_does_not_cancel_assembly() {
    let cache = Arc::new(RegistryCache::new());
    let calls = Arc::new(AtomicUsize::new(0));

    let first = {
        let cache = Arc::clone(&cache);
        let calls = Arc::clone(&calls);
        tokio::spawn(async move {
            cache
                .resolve(REGISTRY, move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Some(view_with_hash("acme/a", "h1"))
                })
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(10)).await;
    first.abort();
    assert!(cache.state(REGISTRY).unwrap().is_pending());

    let view = cache
        .resolve(REGISTRY, || async { None })
        .await
        .unwrap();
    assert_eq!(view.provider_package_hashes["acme/a"], "h1");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_panicking_assembly_reads_as_failed() {
    let cache = RegistryCache::new();

    let result = cache
        .resolve(REGISTRY, || async {
            if true {
                panic!("assembly blew up");
            }
            Some(RegistryView::default())
        })
        .await;

    assert!(result.is_none());
}

#[test]
fn test_empty_cache() {
    let cache = RegistryCache::default();
    assert!(cache.is_empty());
    assert!(cache.state(REGISTRY).is_none());
}
