use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use crossbeam::sync::WaitGroup;
use keyed_sync::list::NodeList;
use keyed_sync::{BoundedHandoffQueue, KeyedWorkerPool};
use std::hint::black_box;
use std::time::Duration;

// Benchmark 1: buffered put/take round trip
fn bench_buffered_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_buffered");
    group.throughput(Throughput::Elements(1));

    let queue = BoundedHandoffQueue::new(1024);
    group.bench_function("put_take", |b| {
        b.iter(|| {
            assert!(queue.put(black_box(1u64), Duration::ZERO));
            black_box(queue.take().get().unwrap())
        })
    });

    group.finish();
}

// Benchmark 2: pending-receive handoff (take first, put second)
fn bench_pending_handoff(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_handoff");
    group.throughput(Throughput::Elements(1));

    let queue = BoundedHandoffQueue::new(0);
    group.bench_function("take_put_get", |b| {
        b.iter(|| {
            let handle = queue.take();
            assert!(queue.put(black_box(1u64), Duration::ZERO));
            black_box(handle.get().unwrap())
        })
    });

    group.finish();
}

// Benchmark 3: keyed dispatch throughput at different batch sizes
fn bench_keyed_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_dispatch");

    for size in [100, 1000, 10000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("batch", size), &size, |b, &size| {
            let pool = KeyedWorkerPool::new(num_cpus::get(), Duration::from_secs(60));
            b.iter(|| {
                let wg = WaitGroup::new();
                for i in 0..size {
                    let wg = wg.clone();
                    pool.execute(
                        move || {
                            black_box(i);
                            drop(wg);
                        },
                        i % 16,
                    )
                    .unwrap();
                }
                wg.wait();
            });
        });
    }

    group.finish();
}

// Benchmark 4: node list primitives
fn bench_node_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("node_list");

    for size in [100, 1000, 10000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("push_pop", size), &size, |b, &size| {
            b.iter(|| {
                let mut list = NodeList::new();
                for i in 0..size {
                    list.push_back(black_box(i));
                }
                while let Some(value) = list.pop_front() {
                    black_box(value);
                }
            });
        });
    }

    group.bench_function("remove_middle", |b| {
        b.iter(|| {
            let mut list = NodeList::new();
            let refs: Vec<_> = (0..64).map(|i| list.push_back(i)).collect();
            for node in refs.iter().skip(1).step_by(2) {
                black_box(list.remove(*node));
            }
            while let Some(value) = list.pop_front() {
                black_box(value);
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_buffered_roundtrip,
    bench_pending_handoff,
    bench_keyed_dispatch,
    bench_node_list
);
criterion_main!(benches);
