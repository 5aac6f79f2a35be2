use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use resource_guard::{BoundedCache, BufferPool, CountingSemaphore, RecencyList, SingleFlight};
use std::time::Instant;

/// Benchmark cache reads and writes at different capacities
fn bench_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache");

    for capacity in [64usize, 1024, 16_384] {
        let cache = BoundedCache::new(capacity, None);
        for i in 0..capacity as u64 {
            cache.set(i, i);
        }

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("get_hit", capacity), &capacity, |b, &cap| {
            let mut i = 0u64;
            b.iter(|| {
                i = (i + 1) % cap as u64;
                black_box(cache.get(&i))
            })
        });

        group.bench_with_input(
            BenchmarkId::new("set_evicting", capacity),
            &capacity,
            |b, _| {
                let mut i = capacity as u64;
                b.iter(|| {
                    i += 1;
                    cache.set(black_box(i), i);
                })
            },
        );
    }

    group.finish();
}

/// Benchmark the raw recency list without locking or metrics
fn bench_recency_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("recency_list");
    let now = Instant::now();

    group.bench_function("churn_1024", |b| {
        let mut list = RecencyList::new(1024);
        let mut i = 0u64;
        b.iter(|| {
            i += 1;
            list.insert(i, i, None);
            black_box(list.get(&(i / 2), now).hit());
        })
    });

    group.finish();
}

/// Benchmark the uncontended semaphore fast path
fn bench_semaphore(c: &mut Criterion) {
    let mut group = c.benchmark_group("semaphore");
    let sem = CountingSemaphore::new(16);

    group.bench_function("try_acquire_release", |b| {
        b.iter(|| black_box(sem.try_acquire()))
    });

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime");
    group.bench_function("acquire_uncontended", |b| {
        b.to_async(&runtime).iter(|| async {
            let _permit = sem.acquire().await;
        })
    });

    group.finish();
}

/// Benchmark single-flight overhead for a lone caller
fn bench_single_flight(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime");
    let flights: SingleFlight<u64, u64> = SingleFlight::new();

    c.bench_function("single_flight/uncontended", |b| {
        let mut key = 0u64;
        b.to_async(&runtime).iter(|| {
            key = key.wrapping_add(1);
            let key = key;
            let flights = &flights;
            async move { black_box(flights.run(key, async move { key.wrapping_mul(2) }).await) }
        })
    });
}

/// Benchmark buffer checkout and return
fn bench_buffer_pool(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_pool");

    for size in [4096usize, 65_536] {
        let pool = BufferPool::new(size, 16);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("get_fill_return", size), &size, |b, &size| {
            b.iter(|| {
                let mut buf = pool.get();
                buf.resize(size, 0xAB);
                black_box(buf.len())
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_cache,
    bench_recency_list,
    bench_semaphore,
    bench_single_flight,
    bench_buffer_pool
);
criterion_main!(benches);
