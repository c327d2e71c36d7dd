//! Deadline arithmetic for bounded waits.
//!
//! Every blocking loop in this crate computes an absolute deadline once and
//! re-reads the monotonic clock after each wake, so repeated spurious wakeups
//! cannot drift the effective timeout.

use std::time::{Duration, Instant};

/// True for a zero timeout: the caller wants an immediate answer, never a wait.
pub fn no_wait(timeout: Duration) -> bool {
    timeout.is_zero()
}

/// Absolute deadline for a relative timeout, on the monotonic clock.
pub fn deadline_for(timeout: Duration) -> Instant {
    Instant::now() + timeout
}

/// Time left until `deadline`, saturating to zero once it has passed.
pub fn remaining_until(deadline: Instant) -> Duration {
    deadline.saturating_duration_since(Instant::now())
}

/// True once a remaining time reports its deadline as passed.
pub fn is_expired(remaining: Duration) -> bool {
    remaining.is_zero()
}
