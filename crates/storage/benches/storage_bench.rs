use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use tokio::time::Duration;

use expiremap_storage::ExpiringStore;

fn bench_set_get_sequential(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("set_get_sequential_10k", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store: ExpiringStore<String, u64> = ExpiringStore::new();
                for i in 0..10_000 {
                    let key = format!("key:{i}");
                    store.set(key.clone(), i);
                    black_box(store.get(&key));
                }
            });
        })
    });
}

fn bench_get_many_versions(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let _guard = rt.enter();
    let store: ExpiringStore<u64, u64> = ExpiringStore::new();
    for i in 0..64 {
        store.set_with_ttl(1, i, Duration::from_secs(60 + i));
    }

    c.bench_function("get_bucket_64_versions", |b| {
        b.iter(|| black_box(store.get(&1)))
    });
}

fn bench_set_concurrent(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("set_concurrent_4_threads_10k", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store: Arc<ExpiringStore<u64, u64>> = Arc::new(ExpiringStore::new());
                let mut handles = Vec::new();

                for t in 0..4 {
                    let store = store.clone();
                    handles.push(tokio::spawn(async move {
                        for i in 0..2_500 {
                            store.set(t * 10_000 + i, i);
                        }
                    }));
                }

                for h in handles {
                    h.await.unwrap();
                }
            });
        })
    });
}

fn bench_purge(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("purge_10k_expired", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store: ExpiringStore<u64, u64> = ExpiringStore::new();
                for i in 0..10_000 {
                    store.set_with_ttl(i, i, Duration::ZERO);
                }
                black_box(store.purge_expired());
            });
        })
    });
}

criterion_group!(
    benches,
    bench_set_get_sequential,
    bench_get_many_versions,
    bench_set_concurrent,
    bench_purge,
);
criterion_main!(benches);
