//! Kernel-style worker pool with per-key mutual exclusion.
//!
//! Workers pull from a shared pending list; at most one task per distinct
//! key runs at a time, while tasks under different keys run in parallel.
//! Threads are created on demand up to `max_pool_size` and retire on their
//! own once a fixed keep-alive deadline passes with no eligible work.

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, trace};

use crate::errors::RejectedError;
use crate::list::NodeList;
use crate::model::PoolMetrics;
use crate::timeouts;

/// Pool sizing and lifecycle configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub max_pool_size: usize,
    pub keep_alive: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_pool_size: num_cpus::get(),
            keep_alive: Duration::from_secs(30),
        }
    }
}

impl Config {
    pub fn cpu_bound() -> Self {
        Self {
            max_pool_size: num_cpus::get(),
            keep_alive: Duration::from_secs(60),
        }
    }

    pub fn io_bound() -> Self {
        Self {
            max_pool_size: num_cpus::get() * 2,
            keep_alive: Duration::from_secs(30),
        }
    }
}

type Task = Box<dyn FnOnce() + Send + 'static>;

struct Work<K> {
    task: Task,
    key: K,
}

/// Dynamically-sized worker pool that serializes tasks sharing a key.
///
/// Clones share the same pool.
pub struct KeyedWorkerPool<K> {
    inner: Arc<PoolInner<K>>,
}

impl<K> Clone for KeyedWorkerPool<K> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

struct PoolInner<K> {
    state: Mutex<PoolState<K>>,
    new_work: Condvar,
    terminated: Condvar,
    config: Config,
    next_worker_id: AtomicUsize,
}

struct PoolState<K> {
    pending: NodeList<Work<K>>,
    running_keys: HashSet<K>,
    worker_threads: usize,
    busy: usize,
    shutdown: bool,
}

impl<K> KeyedWorkerPool<K>
where
    K: Eq + Hash + Clone + Send + 'static,
{
    pub fn new(max_pool_size: usize, keep_alive: Duration) -> Self {
        Self::with_config(Config {
            max_pool_size,
            keep_alive,
        })
    }

    pub fn with_config(config: Config) -> Self {
        assert!(
            config.max_pool_size > 0,
            "pool must allow at least one thread"
        );
        Self {
            inner: Arc::new(PoolInner {
                state: Mutex::new(PoolState {
                    pending: NodeList::new(),
                    running_keys: HashSet::new(),
                    worker_threads: 0,
                    busy: 0,
                    shutdown: false,
                }),
                new_work: Condvar::new(),
                terminated: Condvar::new(),
                config,
                next_worker_id: AtomicUsize::new(0),
            }),
        }
    }

    /// Queue `task` under `key`.
    ///
    /// Tasks sharing a key execute one at a time, in submission order; tasks
    /// under different keys may run in parallel. A new worker thread is
    /// spawned when every current worker is busy and the pool is below
    /// `max_pool_size`. Fails only after [`KeyedWorkerPool::shutdown`].
    pub fn execute<F>(&self, task: F, key: K) -> Result<(), RejectedError>
    where
        F: FnOnce() + Send + 'static,
    {
        let inner = &*self.inner;
        let mut state = inner.state.lock();
        if state.shutdown {
            debug!("task rejected, pool is shut down");
            return Err(RejectedError);
        }
        state.pending.push_back(Work {
            task: Box::new(task),
            key,
        });
        let saturated = state.busy == state.worker_threads;
        if saturated && state.worker_threads < inner.config.max_pool_size {
            self.spawn_worker(&mut state);
        }
        inner.new_work.notify_one();
        Ok(())
    }

    /// Spawn one worker with a fresh keep-alive deadline. Called with the
    /// pool lock held.
    fn spawn_worker(&self, state: &mut PoolState<K>) {
        let id = self.inner.next_worker_id.fetch_add(1, Ordering::Relaxed);
        let deadline = timeouts::deadline_for(self.inner.config.keep_alive);
        let inner = self.inner.clone();
        let spawned = thread::Builder::new()
            .name(format!("keyed-worker-{id}"))
            .spawn(move || worker_loop(inner, deadline));
        match spawned {
            Ok(_join) => {
                state.worker_threads += 1;
                debug!(worker = id, threads = state.worker_threads, "worker thread started");
            }
            Err(err) => {
                // the item stays pending; an existing worker or a later
                // execute picks it up
                error!(worker = id, %err, "failed to spawn worker thread");
            }
        }
    }

    /// Stop accepting new work. Irreversible.
    ///
    /// In-flight tasks finish and already-queued work still executes; idle
    /// workers notice the shutdown when their keep-alive next expires.
    pub fn shutdown(&self) {
        let mut state = self.inner.state.lock();
        if !state.shutdown {
            state.shutdown = true;
            debug!(
                pending = state.pending.len(),
                threads = state.worker_threads,
                "pool shutdown requested"
            );
        }
    }

    /// Wait up to `timeout` for the pool to terminate.
    ///
    /// Terminated means no worker threads remain and the pending list is
    /// empty. An already-terminated pool reports `true` even with a zero
    /// timeout; otherwise a zero timeout returns `false` without blocking.
    pub fn await_termination(&self, timeout: Duration) -> bool {
        let inner = &*self.inner;
        let mut state = inner.state.lock();
        if state.worker_threads == 0 && state.pending.is_empty() {
            return true;
        }
        if timeouts::no_wait(timeout) {
            return false;
        }
        let deadline = timeouts::deadline_for(timeout);
        loop {
            let _ = inner.terminated.wait_until(&mut state, deadline);
            if state.worker_threads == 0 && state.pending.is_empty() {
                return true;
            }
            if timeouts::is_expired(timeouts::remaining_until(deadline)) {
                return false;
            }
        }
    }

    pub fn metrics(&self) -> PoolMetrics {
        let state = self.inner.state.lock();
        PoolMetrics {
            worker_threads: state.worker_threads,
            busy: state.busy,
            pending: state.pending.len(),
            running_keys: state.running_keys.len(),
            shutdown: state.shutdown,
        }
    }
}

fn worker_loop<K>(inner: Arc<PoolInner<K>>, deadline: Instant)
where
    K: Eq + Hash + Clone + Send + 'static,
{
    let mut previous_key: Option<K> = None;
    loop {
        match inner.get_work(deadline, previous_key.take()) {
            Some(work) => {
                (work.task)();
                previous_key = Some(work.key);
            }
            None => return,
        }
    }
}

impl<K> PoolInner<K>
where
    K: Eq + Hash + Clone + Send + 'static,
{
    /// One scheduling round for a worker: release the previous key, claim
    /// the oldest eligible item, or wait for one until `deadline`.
    ///
    /// Returning `None` retires the calling thread.
    fn get_work(&self, deadline: Instant, previous_key: Option<K>) -> Option<Work<K>> {
        let mut state = self.state.lock();
        if let Some(key) = previous_key {
            state.busy -= 1;
            state.running_keys.remove(&key);
        }
        if let Some(work) = Self::claim_eligible(&mut state) {
            return Some(work);
        }
        if state.shutdown && state.pending.is_empty() {
            return self.retire(&mut state);
        }
        loop {
            let _ = self.new_work.wait_until(&mut state, deadline);
            if let Some(work) = Self::claim_eligible(&mut state) {
                return Some(work);
            }
            if timeouts::is_expired(timeouts::remaining_until(deadline)) {
                // keep-alive expired with no eligible work
                return self.retire(&mut state);
            }
        }
    }

    /// Head-to-tail scan for the first item whose key is not in flight.
    fn claim_eligible(state: &mut PoolState<K>) -> Option<Work<K>> {
        let PoolState {
            pending,
            running_keys,
            busy,
            ..
        } = state;
        let node = pending
            .iter()
            .find_map(|(node, work)| (!running_keys.contains(&work.key)).then_some(node))?;
        let work = pending.remove(node);
        running_keys.insert(work.key.clone());
        *busy += 1;
        trace!(busy = *busy, "work item claimed");
        Some(work)
    }

    fn retire(&self, state: &mut PoolState<K>) -> Option<Work<K>> {
        state.worker_threads -= 1;
        debug!(threads = state.worker_threads, "worker retired");
        if state.worker_threads == 0 {
            self.terminated.notify_all();
        }
        None
    }
}
