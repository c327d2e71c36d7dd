use keyed_sync::{BoundedHandoffQueue, KeyedWorkerPool};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    const MESSAGES: usize = 200_000;
    const TASKS: usize = 200_000;

    let queue = BoundedHandoffQueue::new(64);
    let producer = {
        let queue = queue.clone();
        thread::spawn(move || {
            for i in 0..MESSAGES {
                while !queue.put(i, Duration::from_millis(100)) {}
            }
        })
    };
    let now = Instant::now();
    let mut received = 0usize;
    for _ in 0..MESSAGES {
        if queue.take().get().is_ok() {
            received += 1;
        }
    }
    producer.join().unwrap();
    println!("queue: {received} messages in {:?}", now.elapsed());

    let pool = KeyedWorkerPool::new(num_cpus::get(), Duration::from_millis(200));
    let counter = Arc::new(AtomicUsize::new(0));
    let now = Instant::now();
    for i in 0..TASKS {
        let counter = counter.clone();
        pool.execute(
            move || {
                counter.fetch_add(1, Ordering::Relaxed);
            },
            i % 32,
        )
        .unwrap();
    }
    pool.shutdown();
    while !pool.await_termination(Duration::from_secs(1)) {}
    println!(
        "pool: {} tasks in {:?}",
        counter.load(Ordering::Relaxed),
        now.elapsed()
    );
}
