//! Receive handles returned by `BoundedHandoffQueue::take`.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::trace;

use crate::errors::{ReceiveError, ReceiveTimeoutError};
use crate::list::NodeRef;
use crate::queue::{Request, Shared};
use crate::timeouts;

/// Handle on one message claim against the queue.
///
/// A take that found a buffered message yields an already-completed handle;
/// otherwise the handle is bound to a registered pending request that a later
/// put fulfils in arrival order. The message is moved out of the handle at
/// most once.
pub struct ReceiveHandle<M> {
    inner: Inner<M>,
}

enum Inner<M> {
    Completed(Mutex<Option<M>>),
    Pending(Pending<M>),
}

struct Pending<M> {
    shared: Arc<Shared<M>>,
    request: Arc<Request<M>>,
    node: NodeRef,
}

impl<M> ReceiveHandle<M> {
    pub(crate) fn completed(message: M) -> Self {
        Self {
            inner: Inner::Completed(Mutex::new(Some(message))),
        }
    }

    pub(crate) fn pending(shared: Arc<Shared<M>>, request: Arc<Request<M>>, node: NodeRef) -> Self {
        Self {
            inner: Inner::Pending(Pending {
                shared,
                request,
                node,
            }),
        }
    }

    /// Withdraw a still-pending request.
    ///
    /// Returns `false` when there is nothing left to cancel (the handle was
    /// already completed, or a producer fulfilled it first) and `true` when
    /// the request is cancelled — including repeat calls, which stay `true`.
    /// Settlement is atomic with a racing put: exactly one side wins.
    pub fn cancel(&self) -> bool {
        let pending = match &self.inner {
            Inner::Completed(_) => return false,
            Inner::Pending(pending) => pending,
        };
        let mut queue_state = pending.shared.state.lock();
        let mut request_state = pending.request.state.lock();
        if request_state.done {
            return false;
        }
        if request_state.cancelled {
            return true;
        }
        queue_state.requests.remove(pending.node);
        request_state.cancelled = true;
        drop(request_state);
        drop(queue_state);
        // wake a getter blocked on this request, if any
        pending.request.settled.notify_one();
        trace!("pending receive cancelled");
        true
    }

    pub fn is_done(&self) -> bool {
        match &self.inner {
            Inner::Completed(_) => true,
            Inner::Pending(pending) => pending.request.state.lock().done,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        match &self.inner {
            Inner::Completed(_) => false,
            Inner::Pending(pending) => pending.request.state.lock().cancelled,
        }
    }

    /// Wait without bound until the message arrives or the request is
    /// cancelled.
    pub fn get(&self) -> Result<M, ReceiveError> {
        let pending = match &self.inner {
            Inner::Completed(slot) => {
                return slot.lock().take().ok_or(ReceiveError::AlreadyTaken)
            }
            Inner::Pending(pending) => pending,
        };
        let mut request_state = pending.request.state.lock();
        loop {
            if request_state.done {
                return request_state
                    .message
                    .take()
                    .ok_or(ReceiveError::AlreadyTaken);
            }
            if request_state.cancelled {
                return Err(ReceiveError::Cancelled);
            }
            pending.request.settled.wait(&mut request_state);
        }
    }

    /// Wait up to `timeout` for the message.
    ///
    /// A timed-out request stays registered and may still be fulfilled by a
    /// later put; call `cancel` to withdraw a handle you are abandoning,
    /// otherwise a producer can hand a message to nobody.
    pub fn get_timeout(&self, timeout: Duration) -> Result<M, ReceiveTimeoutError> {
        let pending = match &self.inner {
            Inner::Completed(slot) => {
                return slot.lock().take().ok_or(ReceiveTimeoutError::AlreadyTaken)
            }
            Inner::Pending(pending) => pending,
        };
        let deadline = timeouts::deadline_for(timeout);
        let mut request_state = pending.request.state.lock();
        loop {
            if request_state.done {
                return request_state
                    .message
                    .take()
                    .ok_or(ReceiveTimeoutError::AlreadyTaken);
            }
            if request_state.cancelled {
                return Err(ReceiveTimeoutError::Cancelled);
            }
            if timeouts::is_expired(timeouts::remaining_until(deadline)) {
                return Err(ReceiveTimeoutError::TimedOut);
            }
            let _ = pending
                .request
                .settled
                .wait_until(&mut request_state, deadline);
        }
    }
}
