use thiserror::Error;

/// Failure of a blocking `get` on a receive handle.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveError {
    /// The pending receive was cancelled before a producer matched it.
    #[error("pending receive was cancelled")]
    Cancelled,
    /// The message was already moved out of this handle.
    #[error("message was already taken from this handle")]
    AlreadyTaken,
}

/// Failure of a deadline-bounded `get_timeout` on a receive handle.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveTimeoutError {
    /// The deadline passed with the request neither fulfilled nor cancelled.
    /// The request stays registered; cancel the handle to withdraw it.
    #[error("timed out before a message arrived")]
    TimedOut,
    /// The pending receive was cancelled before a producer matched it.
    #[error("pending receive was cancelled")]
    Cancelled,
    /// The message was already moved out of this handle.
    #[error("message was already taken from this handle")]
    AlreadyTaken,
}

/// A blocked put was cancelled through its token with no free slot to absorb
/// the message.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("put was interrupted by a cancel token")]
pub struct Interrupted;

/// Work submitted to a pool that has been shut down.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("pool is shut down and no longer accepts work")]
pub struct RejectedError;
