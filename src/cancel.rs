//! Synchronous cancellation latch for blocked producers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

/// One-way cancellation signal shared between threads.
///
/// Cloning is cheap; every clone observes the same latch. Cancelling wakes
/// any wait currently registered through `watch`, so a producer blocked
/// inside the queue re-checks its state immediately instead of sleeping to
/// its deadline. The latch never resets.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<TokenInner>,
}

#[derive(Default)]
struct TokenInner {
    cancelled: AtomicBool,
    watchers: Mutex<Vec<Arc<Condvar>>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trip the latch and wake every registered watcher. Idempotent.
    pub fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        let watchers = self.inner.watchers.lock();
        for condvar in watchers.iter() {
            condvar.notify_all();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Register `condvar` to be woken on cancellation until the returned
    /// guard drops.
    ///
    /// The wake is advisory: a cancel that lands between a waiter's flag
    /// check and its wait is picked up at the next wake or at the deadline,
    /// so watchers must re-check `is_cancelled` on every wake.
    pub(crate) fn watch(&self, condvar: Arc<Condvar>) -> WatchGuard<'_> {
        self.inner.watchers.lock().push(condvar.clone());
        WatchGuard {
            token: self,
            condvar,
        }
    }
}

pub(crate) struct WatchGuard<'a> {
    token: &'a CancelToken,
    condvar: Arc<Condvar>,
}

impl Drop for WatchGuard<'_> {
    fn drop(&mut self) {
        let mut watchers = self.token.inner.watchers.lock();
        if let Some(pos) = watchers.iter().position(|c| Arc::ptr_eq(c, &self.condvar)) {
            watchers.swap_remove(pos);
        }
    }
}
