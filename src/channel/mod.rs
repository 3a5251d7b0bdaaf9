// src/channel/mod.rs

//! The rendezvous channel: synchronous hand-off of one value per matched
//! (send, receive) pair.
//!
//! A [`Channel`] has capacity zero. A send completes only when a receive
//! claims the value, so the two sides meet at the same instant and the value
//! is never buffered. Each side has its own FIFO of unmatched callers:
//! whichever side arrives second pops the oldest record from the opposite
//! queue, giving strict first-come-first-served fairness per side.
//!
//! Blocking (`send`/`recv`) and future-based (`send_async`/`recv_async`)
//! callers share the same queues and interoperate freely.
//!
//! Closing is the only cancellation mechanism: `close()` cancels every queued
//! receiver and rejects all future sends, but deliberately leaves queued
//! senders in place - their values remain claimable through `try_recv`/`recv`
//! until drained.
//!
//! ```
//! use rendezvous::Channel;
//!
//! let ch: Channel<u32> = Channel::new();
//! let producer = ch.clone();
//! let worker = std::thread::spawn(move || producer.send(7));
//!
//! assert_eq!(ch.recv(), Ok(7));
//! worker.join().unwrap().unwrap();
//! ```

// Re-export the futures so callers can name them.
pub use async_impl::{RecvFuture, RecvStream, SendFuture};

mod async_impl;
pub(crate) mod core;

use self::core::{ChannelShared, RecvOutcome, SendOutcome};
use crate::error::{RecvError, SendError, TryRecvError, TrySendError};
use crate::internal::signal::Signal;

use std::sync::Arc;

/// An unbuffered (capacity-zero) channel.
///
/// The handle is cheap to clone and every clone refers to the same channel.
/// There is deliberately no sender/receiver split: any holder may send,
/// receive or close, CSP-style. The channel's state lives for as long as any
/// handle does; `close()` only disables future traffic, it does not destroy
/// anything.
#[derive(Debug)]
pub struct Channel<T: Send> {
  pub(crate) shared: Arc<ChannelShared<T>>,
}

impl<T: Send> Clone for Channel<T> {
  fn clone(&self) -> Self {
    Channel {
      shared: Arc::clone(&self.shared),
    }
  }
}

impl<T: Send> Default for Channel<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T: Send> Channel<T> {
  /// Creates a new open channel.
  pub fn new() -> Self {
    Channel {
      shared: Arc::new(ChannelShared::new()),
    }
  }

  /// Attempts to hand `item` to an already-waiting receiver without blocking.
  ///
  /// Fails with [`TrySendError::Closed`] on a closed channel and
  /// [`TrySendError::Full`] when no receiver is queued; both return the value
  /// and leave the channel untouched.
  pub fn try_send(&self, item: T) -> Result<(), TrySendError<T>> {
    self.shared.try_send_core(item)
  }

  /// Sends `item`, blocking the calling thread until a receiver claims it.
  ///
  /// Fails with [`SendError::Closed`] if the channel is already closed (the
  /// value is not queued). Once the value is queued the wait ends only when a
  /// receiver claims it - closing the channel does not cancel queued senders.
  pub fn send(&self, item: T) -> Result<(), SendError> {
    match self.shared.send_core(item) {
      SendOutcome::Delivered => Ok(()),
      SendOutcome::Closed(_) => Err(SendError::Closed),
      SendOutcome::Queued(delivered) => match delivered.wait() {
        Some(()) => Ok(()),
        // Queued sends are never cancelled by the core; mapped for robustness.
        None => Err(SendError::Closed),
      },
    }
  }

  /// Sends `item`, suspending the calling task until a receiver claims it.
  ///
  /// Same contract as [`send`](Channel::send). Dropping the returned future
  /// after the value has been queued does not withdraw the value.
  pub fn send_async(&self, item: T) -> SendFuture<'_, T> {
    SendFuture::new(self, item)
  }

  /// Attempts to claim a queued sender's value without blocking.
  ///
  /// Still succeeds on a closed channel while senders remain queued; reports
  /// [`TryRecvError::Closed`] only once the channel is closed *and* drained.
  pub fn try_recv(&self) -> Result<T, TryRecvError> {
    self.shared.try_recv_core()
  }

  /// Receives a value, blocking the calling thread until a sender provides
  /// one.
  ///
  /// Fails with [`RecvError::Cancelled`] if the channel is closed with no
  /// queued sender left, or closes while this receive is queued.
  pub fn recv(&self) -> Result<T, RecvError> {
    match self.shared.recv_core() {
      RecvOutcome::Value(item) => Ok(item),
      RecvOutcome::Closed => Err(RecvError::Cancelled),
      RecvOutcome::Queued(slot) => match slot.wait() {
        Some(item) => Ok(item),
        None => Err(RecvError::Cancelled),
      },
    }
  }

  /// Receives a value, suspending the calling task until a sender provides
  /// one.
  ///
  /// Same contract as [`recv`](Channel::recv). Dropping a pending future
  /// deregisters it from the channel.
  pub fn recv_async(&self) -> RecvFuture<'_, T> {
    RecvFuture::new(self)
  }

  /// A stream of received values; ends when the channel is closed and every
  /// queued sender has been drained.
  pub fn stream(&self) -> RecvStream<'_, T> {
    RecvStream::new(self)
  }

  /// Closes the channel. Idempotent.
  ///
  /// Cancels every currently queued receiver in FIFO order and makes all
  /// future sends fail. Queued senders are left in place and stay claimable.
  pub fn close(&self) {
    self.shared.close_core();
  }

  /// Point-in-time read of the closed flag.
  pub fn is_closed(&self) -> bool {
    self.shared.is_closed_core()
  }

  // Select support. These are the only entry points that touch the
  // select-waiter queue; see `select::Select` for the protocol.

  pub(crate) fn add_waiter(&self, waiter: &Arc<Signal<()>>) {
    self.shared.add_waiter(waiter);
  }

  pub(crate) fn remove_waiter(&self, waiter: &Arc<Signal<()>>) {
    self.shared.remove_waiter(waiter);
  }
}
