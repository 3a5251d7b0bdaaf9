// src/channel/async_impl.rs

//! Future-based send and receive, plus the receive-side `Stream`.

use super::core::{RecvOutcome, SendOutcome};
use super::Channel;
use crate::error::{RecvError, SendError};
use crate::internal::signal::Signal;

use futures_core::Stream;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

// --- SendFuture ---

/// A future that completes when a receiver has claimed the value.
///
/// Once the value has been queued, dropping this future does not withdraw it;
/// a later receiver will still claim it, because queued senders are never
/// cancelled.
#[must_use = "futures do nothing unless you .await or poll them"]
#[derive(Debug)]
pub struct SendFuture<'a, T: Send> {
  channel: &'a Channel<T>,
  item: Option<T>,
  delivered: Option<Arc<Signal<()>>>,
}

// All state is accessed through a plain `&mut`; nothing relies on a stable
// address.
impl<T: Send> Unpin for SendFuture<'_, T> {}

impl<'a, T: Send> SendFuture<'a, T> {
  pub(super) fn new(channel: &'a Channel<T>, item: T) -> Self {
    SendFuture {
      channel,
      item: Some(item),
      delivered: None,
    }
  }
}

impl<T: Send> Future for SendFuture<'_, T> {
  type Output = Result<(), SendError>;

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    let this = self.get_mut();

    // Already queued on an earlier poll: just watch the delivery signal.
    if let Some(delivered) = this.delivered.take() {
      return match delivered.poll_wait(cx) {
        Poll::Pending => {
          this.delivered = Some(delivered);
          Poll::Pending
        }
        Poll::Ready(Some(())) => Poll::Ready(Ok(())),
        Poll::Ready(None) => Poll::Ready(Err(SendError::Closed)),
      };
    }

    let item = match this.item.take() {
      Some(item) => item,
      // Polled again after completion.
      None => return Poll::Ready(Ok(())),
    };

    match this.channel.shared.send_core(item) {
      SendOutcome::Delivered => Poll::Ready(Ok(())),
      SendOutcome::Closed(_) => Poll::Ready(Err(SendError::Closed)),
      SendOutcome::Queued(delivered) => match delivered.poll_wait(cx) {
        Poll::Pending => {
          this.delivered = Some(delivered);
          Poll::Pending
        }
        Poll::Ready(Some(())) => Poll::Ready(Ok(())),
        Poll::Ready(None) => Poll::Ready(Err(SendError::Closed)),
      },
    }
  }
}

// --- RecvFuture ---

/// A future that completes when a sender's value has been claimed, or with
/// [`RecvError::Cancelled`] if the channel closes first.
///
/// Dropping a pending future deregisters its slot from the channel, so a
/// later send matches the next queued receiver instead.
#[must_use = "futures do nothing unless you .await or poll them"]
#[derive(Debug)]
pub struct RecvFuture<'a, T: Send> {
  channel: &'a Channel<T>,
  slot: Option<Arc<Signal<T>>>,
  done: bool,
}

impl<T: Send> Unpin for RecvFuture<'_, T> {}

impl<'a, T: Send> RecvFuture<'a, T> {
  pub(super) fn new(channel: &'a Channel<T>) -> Self {
    RecvFuture {
      channel,
      slot: None,
      done: false,
    }
  }
}

impl<T: Send> Future for RecvFuture<'_, T> {
  type Output = Result<T, RecvError>;

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    let this = self.get_mut();
    if this.done {
      panic!("RecvFuture polled after completion");
    }

    if let Some(slot) = this.slot.take() {
      return match slot.poll_wait(cx) {
        Poll::Pending => {
          this.slot = Some(slot);
          Poll::Pending
        }
        Poll::Ready(Some(item)) => {
          this.done = true;
          Poll::Ready(Ok(item))
        }
        Poll::Ready(None) => {
          this.done = true;
          Poll::Ready(Err(RecvError::Cancelled))
        }
      };
    }

    match this.channel.shared.recv_core() {
      RecvOutcome::Value(item) => {
        this.done = true;
        Poll::Ready(Ok(item))
      }
      RecvOutcome::Closed => {
        this.done = true;
        Poll::Ready(Err(RecvError::Cancelled))
      }
      RecvOutcome::Queued(slot) => match slot.poll_wait(cx) {
        Poll::Pending => {
          this.slot = Some(slot);
          Poll::Pending
        }
        Poll::Ready(Some(item)) => {
          this.done = true;
          Poll::Ready(Ok(item))
        }
        Poll::Ready(None) => {
          this.done = true;
          Poll::Ready(Err(RecvError::Cancelled))
        }
      },
    }
  }
}

impl<T: Send> Drop for RecvFuture<'_, T> {
  fn drop(&mut self) {
    if let Some(slot) = self.slot.take() {
      // If the slot already resolved it is no longer queued, and any value it
      // carries is dropped with it.
      self.channel.shared.forget_recv(&slot);
    }
  }
}

// --- RecvStream ---

/// A stream of received values.
///
/// Yields values as senders provide them and ends (`None`) once the channel
/// is closed and every queued sender has been drained.
#[must_use = "streams do nothing unless polled"]
#[derive(Debug)]
pub struct RecvStream<'a, T: Send> {
  channel: &'a Channel<T>,
  slot: Option<Arc<Signal<T>>>,
  done: bool,
}

impl<T: Send> Unpin for RecvStream<'_, T> {}

impl<'a, T: Send> RecvStream<'a, T> {
  pub(super) fn new(channel: &'a Channel<T>) -> Self {
    RecvStream {
      channel,
      slot: None,
      done: false,
    }
  }
}

impl<T: Send> Stream for RecvStream<'_, T> {
  type Item = T;

  fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
    let this = self.get_mut();
    if this.done {
      return Poll::Ready(None);
    }

    if let Some(slot) = this.slot.take() {
      return match slot.poll_wait(cx) {
        Poll::Pending => {
          this.slot = Some(slot);
          Poll::Pending
        }
        Poll::Ready(Some(item)) => Poll::Ready(Some(item)),
        Poll::Ready(None) => {
          this.done = true;
          Poll::Ready(None)
        }
      };
    }

    match this.channel.shared.recv_core() {
      RecvOutcome::Value(item) => Poll::Ready(Some(item)),
      RecvOutcome::Closed => {
        this.done = true;
        Poll::Ready(None)
      }
      RecvOutcome::Queued(slot) => match slot.poll_wait(cx) {
        Poll::Pending => {
          this.slot = Some(slot);
          Poll::Pending
        }
        Poll::Ready(Some(item)) => Poll::Ready(Some(item)),
        Poll::Ready(None) => {
          this.done = true;
          Poll::Ready(None)
        }
      },
    }
  }
}

impl<T: Send> Drop for RecvStream<'_, T> {
  fn drop(&mut self) {
    if let Some(slot) = self.slot.take() {
      self.channel.shared.forget_recv(&slot);
    }
  }
}
