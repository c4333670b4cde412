//! Performance benchmarks for refresh-kit
//!
//! This benchmark suite measures:
//! - InMemory backend operations (set, get)
//! - Read path through the service (fresh hit, miss, bypass)
//! - Freshness classification
//! - Entry encoding across payload sizes
//!
//! Run with: cargo bench
//! View results: open target/criterion/report/index.html

use chrono::Utc;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use refresh_kit::backend::{CacheBackend, InMemoryBackend};
use refresh_kit::policy::classify;
use refresh_kit::serialization::{decode_entry, encode_entry};
use refresh_kit::{
    CacheConfig, CacheEntry, CacheService, CacheTimes, CacheableResource, RequestCacheOptions,
};
use std::hint::black_box;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// ============================================================================
// Benchmark Test Fixtures
// ============================================================================

/// Resource producing a payload of configurable size
struct BenchResource {
    id: String,
    size: usize,
    options: RequestCacheOptions,
}

impl BenchResource {
    fn new(id: impl Into<String>, size: usize) -> Self {
        BenchResource {
            id: id.into(),
            size,
            options: RequestCacheOptions::default(),
        }
    }
}

impl CacheableResource for BenchResource {
    type Payload = Vec<u8>;

    fn hash(&self) -> String {
        self.id.clone()
    }

    fn cache_tags(&self) -> Vec<String> {
        vec!["bench".to_string()]
    }

    fn cache_times(&self) -> CacheTimes {
        CacheTimes::from_secs(3600, 600, 0)
    }

    fn cache_options(&self) -> RequestCacheOptions {
        self.options.clone()
    }

    async fn compute(&self) -> refresh_kit::Result<Vec<u8>> {
        Ok(vec![0u8; self.size])
    }
}

fn service() -> CacheService<InMemoryBackend> {
    CacheService::builder(InMemoryBackend::new())
        .with_config(CacheConfig::new("bench"))
        .build()
        .expect("Failed to build service")
}

// ============================================================================
// Group 1: InMemory Backend Benchmarks
// ============================================================================

fn inmemory_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("inmemory_backend");
    let rt = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");

    for size in [100, 10_000].iter() {
        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("set", size), size, |b, &size| {
                let backend = InMemoryBackend::new();
                let value = vec![1u8; size];

                b.to_async(&rt).iter(|| async {
                    backend
                        .set(black_box("test_key"), black_box(value.clone()), None)
                        .await
                        .expect("Failed to set")
                });
            });

        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("get_hit", size), size, |b, &size| {
                let backend = InMemoryBackend::new();
                rt.block_on(async {
                    backend
                        .set("test_key", vec![1u8; size], None)
                        .await
                        .expect("Failed to set");
                });

                b.to_async(&rt)
                    .iter(|| async { backend.get(black_box("test_key")).await });
            });
    }

    group.bench_function("get_miss", |b| {
        let backend = InMemoryBackend::new();

        b.to_async(&rt)
            .iter(|| async { backend.get(black_box("nonexistent_key")).await });
    });

    group.finish();
}

// ============================================================================
// Group 2: Read Path Benchmarks
// ============================================================================

fn read_path_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_path");
    let rt = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");

    for size in [100, 1_000, 10_000].iter() {
        // Measures: lookup + decode + classify + annotate
        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("fresh_hit", size), size, |b, &size| {
                let cache = service();
                let resource = Arc::new(BenchResource::new("hit", size));
                rt.block_on(async {
                    cache.get(&resource).await.expect("Failed to populate cache");
                });

                b.to_async(&rt)
                    .iter(|| async { cache.get(black_box(&resource)).await });
            });

        // Measures: lookup + compute + encode + store
        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("miss", size), size, |b, &size| {
                let cache = service();
                let counter = Arc::new(AtomicU64::new(0));

                b.to_async(&rt).iter(|| {
                    let cache = cache.clone();
                    let current = counter.fetch_add(1, Ordering::Relaxed);
                    async move {
                        let resource = Arc::new(BenchResource::new(format!("miss_{}", current), size));
                        cache.get(black_box(&resource)).await
                    }
                });
            });
    }

    // Measures: compute + store, no lookup
    group.bench_function("no_cache", |b| {
        let cache = service();
        let mut resource = BenchResource::new("bypass", 1_000);
        resource.options = RequestCacheOptions::default().with_use_cache(false);
        let resource = Arc::new(resource);

        b.to_async(&rt)
            .iter(|| async { cache.get(black_box(&resource)).await });
    });

    group.finish();
}

// ============================================================================
// Group 3: Classification and Encoding Benchmarks
// ============================================================================

fn entry_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("entry");
    let times = CacheTimes::from_secs(3600, 600, 60);
    let options = RequestCacheOptions::default();

    group.bench_function("classify", |b| {
        let entry = CacheEntry::new(0u32, Utc::now(), &times);
        let now = Utc::now();
        b.iter(|| classify(black_box(Some(&entry)), &options, &times, now));
    });

    for size in [100, 10_000, 100_000].iter() {
        let entry = CacheEntry::new(vec![0u8; *size], Utc::now(), &times);

        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("encode", size), &entry, |b, entry| {
                b.iter(|| encode_entry(black_box(entry)));
            });

        let encoded = encode_entry(&entry).expect("Failed to encode");
        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("decode", size), &encoded, |b, encoded| {
                b.iter(|| decode_entry::<Vec<u8>>(black_box(encoded)));
            });
    }

    group.finish();
}

// ============================================================================
// Benchmark Registration
// ============================================================================

criterion_group!(benches, inmemory_benchmarks, read_path_benchmarks, entry_benchmarks);
criterion_main!(benches);
