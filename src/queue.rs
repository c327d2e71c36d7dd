//! Monitor-style bounded blocking message queue with direct handoff.
//!
//! Producers and consumers rendezvous under one lock. A `put` always serves
//! the oldest pending receiver before it considers the buffer, so the buffer
//! and the pending-receiver list are never non-empty at the same time, and
//! receivers are matched in strict arrival order.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use tracing::trace;

use crate::cancel::CancelToken;
use crate::errors::Interrupted;
use crate::handle::ReceiveHandle;
use crate::list::NodeList;
use crate::model::QueueMetrics;
use crate::timeouts;

/// State of one registered-but-unfulfilled receive.
///
/// Settled exactly once: a fulfilling put sets `done` and the message, an
/// explicit cancel sets `cancelled`. Both happen with the queue lock held, so
/// the race between them has a single winner.
pub(crate) struct Request<M> {
    pub(crate) state: Mutex<RequestState<M>>,
    pub(crate) settled: Condvar,
}

pub(crate) struct RequestState<M> {
    pub(crate) message: Option<M>,
    pub(crate) done: bool,
    pub(crate) cancelled: bool,
}

impl<M> Request<M> {
    fn new() -> Self {
        Self {
            state: Mutex::new(RequestState {
                message: None,
                done: false,
                cancelled: false,
            }),
            settled: Condvar::new(),
        }
    }
}

pub(crate) struct Shared<M> {
    pub(crate) state: Mutex<QueueState<M>>,
    /// Woken when buffer room or (for zero capacity) a receiver appears.
    pub(crate) slot_available: Arc<Condvar>,
    pub(crate) capacity: usize,
}

pub(crate) struct QueueState<M> {
    pub(crate) buffer: NodeList<M>,
    pub(crate) requests: NodeList<Arc<Request<M>>>,
}

/// Bounded blocking message queue with direct producer-to-consumer handoff.
///
/// Capacity 0 disables buffering entirely: every message travels through a
/// pending receiver. Clones share the same queue.
pub struct BoundedHandoffQueue<M> {
    shared: Arc<Shared<M>>,
}

impl<M> Clone for BoundedHandoffQueue<M> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<M> BoundedHandoffQueue<M> {
    pub fn new(capacity: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(QueueState {
                    buffer: NodeList::new(),
                    requests: NodeList::new(),
                }),
                slot_available: Arc::new(Condvar::new()),
                capacity,
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Offer a message, waiting up to `timeout` for room or a receiver.
    ///
    /// Returns `false` if the deadline passes first; the message is dropped
    /// in that case and the caller decides whether to retry.
    pub fn put(&self, message: M, timeout: Duration) -> bool {
        match self.put_inner(message, timeout, None) {
            Ok(accepted) => accepted,
            Err(Interrupted) => unreachable!("no cancel token was supplied"),
        }
    }

    /// Like `put`, but the wait can be interrupted through `token`.
    ///
    /// A cancel that races with a slot opening up is absorbed: the message is
    /// still enqueued, `Ok(true)` is returned, and the token stays cancelled
    /// for the caller to observe. Only a cancel with nowhere to place the
    /// message fails with [`Interrupted`].
    pub fn put_with_token(
        &self,
        message: M,
        timeout: Duration,
        token: &CancelToken,
    ) -> Result<bool, Interrupted> {
        self.put_inner(message, timeout, Some(token))
    }

    fn put_inner(
        &self,
        message: M,
        timeout: Duration,
        token: Option<&CancelToken>,
    ) -> Result<bool, Interrupted> {
        let shared = &*self.shared;
        let mut state = shared.state.lock();

        // fast path
        let mut message = match Self::place(shared, &mut state, message) {
            Ok(()) => return Ok(true),
            Err(message) => message,
        };
        if timeouts::no_wait(timeout) {
            return Ok(false);
        }

        // wait path
        let deadline = timeouts::deadline_for(timeout);
        let _watch = token.map(|t| t.watch(shared.slot_available.clone()));
        if let Some(token) = token {
            if token.is_cancelled() {
                return Self::absorb_cancel(shared, &mut state, message);
            }
        }
        loop {
            let _ = shared.slot_available.wait_until(&mut state, deadline);
            if let Some(token) = token {
                if token.is_cancelled() {
                    return Self::absorb_cancel(shared, &mut state, message);
                }
            }
            message = match Self::place(shared, &mut state, message) {
                Ok(()) => return Ok(true),
                Err(message) => message,
            };
            if timeouts::is_expired(timeouts::remaining_until(deadline)) {
                trace!("put timed out, message dropped");
                return Ok(false);
            }
        }
    }

    /// Serve the oldest pending receiver, or buffer if there is room.
    /// Gives the message back when neither is possible.
    fn place(shared: &Shared<M>, state: &mut QueueState<M>, message: M) -> Result<(), M> {
        if let Some(request) = state.requests.pop_front() {
            let mut request_state = request.state.lock();
            request_state.message = Some(message);
            request_state.done = true;
            drop(request_state);
            request.settled.notify_one();
            trace!("message handed off to pending receiver");
            return Ok(());
        }
        if state.buffer.len() < shared.capacity {
            state.buffer.push_back(message);
            return Ok(());
        }
        Err(message)
    }

    /// Cancellation observed while blocked: a slot that opened in the
    /// meantime still accepts the message; the token stays cancelled either
    /// way.
    fn absorb_cancel(
        shared: &Shared<M>,
        state: &mut QueueState<M>,
        message: M,
    ) -> Result<bool, Interrupted> {
        if state.buffer.len() < shared.capacity {
            state.buffer.push_back(message);
            trace!("cancelled put absorbed into freed slot");
            return Ok(true);
        }
        Err(Interrupted)
    }

    /// Claim the oldest buffered message, or register a pending receive.
    ///
    /// Never blocks: the returned handle is either already completed or waits
    /// on its own behalf through `get`/`get_timeout`.
    pub fn take(&self) -> ReceiveHandle<M> {
        let shared = &*self.shared;
        let mut state = shared.state.lock();
        if let Some(message) = state.buffer.pop_front() {
            // a producer blocked on a full buffer now has room
            shared.slot_available.notify_one();
            return ReceiveHandle::completed(message);
        }
        let request = Arc::new(Request::new());
        let node = state.requests.push_back(request.clone());
        if shared.capacity == 0 {
            // with zero capacity every blocked producer waits for a
            // receiver, not a slot, so the signal must still fire
            shared.slot_available.notify_one();
        }
        ReceiveHandle::pending(self.shared.clone(), request, node)
    }

    pub fn metrics(&self) -> QueueMetrics {
        let state = self.shared.state.lock();
        QueueMetrics {
            buffered: state.buffer.len(),
            pending_requests: state.requests.len(),
            capacity: self.shared.capacity,
        }
    }
}
