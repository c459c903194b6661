//! Common utilities and fixtures for benchmarks

use criterion::Criterion;
use pprof::criterion::{Output, PProfProfiler};
use serde_json::{json, Map, Value};

/// Configure criterion with flamegraph profiling support
pub fn criterion_config() -> Criterion {
    Criterion::default()
        .warm_up_time(std::time::Duration::from_secs(3))
        .measurement_time(std::time::Duration::from_secs(10))
        .sample_size(100)
        .with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)))
}

/// A raw version map with `count` entries, half of them `v`-prefixed
pub fn raw_versions(count: usize) -> Value {
    let versions: Map<String, Value> = (0..count)
        .map(|i| {
            let prefix = if i % 2 == 0 { "v" } else { "" };
            (
                format!("{}{}.{}.{}", prefix, i / 100, (i / 10) % 10, i % 10),
                json!({
                    "homepage": format!("https://acme.test/{}", i),
                    "source": { "url": "https://git.acme.test/widgets.git", "type": "git", "reference": format!("{:040x}", i) },
                    "time": "2023-05-01T10:00:00+00:00"
                }),
            )
        })
        .collect();
    Value::Object(versions)
}

/// A root document listing `shards` provider-includes and `includes` bundles
pub fn root_document(shards: usize, includes: usize) -> Value {
    let provider_includes: Map<String, Value> = (0..shards)
        .map(|i| (format!("p/provider-{}$%hash%.json", i), json!({ "sha256": format!("{:064x}", i) })))
        .collect();
    let includes: Map<String, Value> = (0..includes)
        .map(|i| (format!("include/all${:040x}.json", i), json!({ "sha1": format!("{:040x}", i) })))
        .collect();

    json!({
        "packages": [],
        "includes": includes,
        "provider-includes": provider_includes,
        "providers-url": "/p/%package%$%hash%.json"
    })
}

/// A provider shard naming `packages` packages
pub fn provider_shard(shard: usize, packages: usize) -> Value {
    let providers: Map<String, Value> = (0..packages)
        .map(|i| (format!("vendor{}/package{}", shard, i), json!({ "sha256": format!("{:064x}", i) })))
        .collect();
    json!({ "providers": providers })
}
