//! Hand-built thread synchronizers: a bounded direct-handoff message queue
//! and a keyed worker pool.
//!
//! # Features
//! - Direct producer-to-consumer handoff over a fixed-capacity buffer
//! - Cancellable pending receives with blocking and deadline-bounded waits
//! - Cancel tokens that never lose a message to a timing race
//! - Per-key mutual exclusion with full parallelism across keys
//! - On-demand worker threads up to a maximum, keep-alive self-retirement
//! - Graceful shutdown that drains already-queued work

pub mod cancel;
pub mod errors;
pub mod handle;
pub mod list;
pub mod model;
pub mod pool;
pub mod queue;
pub mod timeouts;

pub use cancel::CancelToken;
pub use handle::ReceiveHandle;
pub use pool::{Config, KeyedWorkerPool};
pub use queue::BoundedHandoffQueue;
