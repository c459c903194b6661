//! Persistent cache benchmarks
//!
//! Measures cache key hashing and record round trips through the memory
//! and file backends.

use camino::Utf8PathBuf;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use quay_benchmarks::{criterion_config, provider_shard};
use quay_cache::{CacheStore, FileStore, MemoryStore};
use quay_core::utils::cache_key_hash;

/// Benchmark cache key hashing for typical shard keys
fn bench_cache_key_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_key_hash");

    for key_len in [32, 128, 512].iter() {
        let key = format!("https://repo.example.com/{}", "p".repeat(*key_len));
        group.throughput(Throughput::Bytes(key.len() as u64));
        group.bench_with_input(BenchmarkId::new("key_len", key_len), &key, |b, key| {
            b.iter(|| black_box(cache_key_hash("datasource-packagist-files", key)));
        });
    }

    group.finish();
}

/// Benchmark set-then-get of a shard record on each backend
fn bench_store_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_round_trip");
    group.measurement_time(std::time::Duration::from_secs(5));

    let record = provider_shard(0, 200);

    let memory = MemoryStore::new();
    group.bench_function("memory", |b| {
        b.iter(|| {
            memory
                .set("bench", "p/provider-0$%hash%.json", record.clone(), 60)
                .unwrap();
            black_box(memory.get("bench", "p/provider-0$%hash%.json"))
        });
    });

    let temp_dir = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    let file = FileStore::new(&root).unwrap();
    group.bench_function("file", |b| {
        b.iter(|| {
            file.set("bench", "p/provider-0$%hash%.json", record.clone(), 60)
                .unwrap();
            black_box(file.get("bench", "p/provider-0$%hash%.json"))
        });
    });

    group.finish();
}

criterion_group! {
    name = benches;
    config = criterion_config();
    targets = bench_cache_key_hash, bench_store_round_trip
}
criterion_main!(benches);
