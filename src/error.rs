// src/error.rs

//! Error types surfaced by channel operations.
//!
//! Only two failure modes originate in the core: a blocking or suspending send
//! observing a closed channel, and a blocking or suspending receive whose wait
//! was (or became) unserviceable because the channel closed. The non-blocking
//! `try_*` operations report "not ready" through their own error enums, which
//! callers should not treat as failures.

use core::fmt;

/// Error returned by a blocking or suspending `send` on a closed channel.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SendError {
  /// The channel was closed before the value could be handed off. The value
  /// was not queued.
  Closed,
}

impl std::error::Error for SendError {}
impl fmt::Display for SendError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SendError::Closed => write!(f, "channel closed"),
    }
  }
}

/// Error returned by a blocking or suspending `recv`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RecvError {
  /// The channel closed while this receive was queued, or was already closed
  /// with no queued sender left to drain.
  Cancelled,
}

impl std::error::Error for RecvError {}
impl fmt::Display for RecvError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RecvError::Cancelled => write!(f, "receive cancelled (channel closed)"),
    }
  }
}

/// Error returned by `try_send` when the value could not be handed off
/// immediately. The value being sent is returned in either case.
#[derive(PartialEq, Eq, Clone)]
pub enum TrySendError<T> {
  /// No receiver was waiting. A rendezvous channel has no buffer, so it is
  /// "full" whenever nobody is queued on the other side.
  Full(T),
  /// The channel is closed.
  Closed(T),
}

impl<T> TrySendError<T> {
  /// Consumes the error, returning the value that could not be sent.
  #[inline]
  pub fn into_inner(self) -> T {
    match self {
      TrySendError::Full(v) => v,
      TrySendError::Closed(v) => v,
    }
  }
}

impl<T> fmt::Debug for TrySendError<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TrySendError::Full(_) => write!(f, "TrySendError::Full(..)"),
      TrySendError::Closed(_) => write!(f, "TrySendError::Closed(..)"),
    }
  }
}

impl<T> fmt::Display for TrySendError<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TrySendError::Full(_) => f.write_str("no receiver waiting"),
      TrySendError::Closed(_) => f.write_str("channel closed"),
    }
  }
}

impl<T: fmt::Debug> std::error::Error for TrySendError<T> {}

/// Error returned by `try_recv` when no value was immediately available.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TryRecvError {
  /// No sender was queued. The channel is still open; a value may arrive.
  Empty,
  /// The channel is closed and every queued sender has been drained. No
  /// further value can ever arrive.
  Closed,
}

impl std::error::Error for TryRecvError {}
impl fmt::Display for TryRecvError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TryRecvError::Empty => write!(f, "no sender waiting"),
      TryRecvError::Closed => write!(f, "channel closed and drained"),
    }
  }
}
