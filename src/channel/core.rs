// src/channel/core.rs

//! The shared, mutex-protected matching engine behind `Channel<T>`.
//!
//! All mutation is serialized by one `parking_lot::Mutex` per channel
//! instance. The lock is held only for O(1) queue manipulation and signal
//! resolution; it is never held across caller code or a suspension point.
//!
//! Invariant: the pending-send and pending-receive queues are never both
//! non-empty at a quiescent instant. Every enqueue first attempts to match
//! against the opposite queue under the lock, and a match removes exactly one
//! record from each side.

use crate::error::{TryRecvError, TrySendError};
use crate::internal::signal::Signal;
use crate::telemetry;

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// A queued, unmatched send: the value plus the signal its blocked or
/// suspended producer waits on. Resolved to "delivered" when a receiver
/// claims the value; never cancelled, not even by close.
#[derive(Debug)]
pub(crate) struct PendingSend<T> {
  pub(crate) item: T,
  pub(crate) delivered: Arc<Signal<()>>,
}

#[derive(Debug)]
pub(crate) struct ChannelState<T> {
  pending_sends: VecDeque<PendingSend<T>>,
  pending_recvs: VecDeque<Arc<Signal<T>>>,
  select_waiters: VecDeque<Arc<Signal<()>>>,
  closed: bool,
}

#[derive(Debug)]
pub(crate) struct ChannelShared<T> {
  internal: Mutex<ChannelState<T>>,
}

/// Outcome of committing a send under the lock.
pub(crate) enum SendOutcome<T> {
  /// Handed directly to a queued receiver.
  Delivered,
  /// Queued; the caller must wait on this signal.
  Queued(Arc<Signal<()>>),
  /// The channel is closed; the value is handed back, not queued.
  Closed(T),
}

/// Outcome of committing a receive under the lock.
pub(crate) enum RecvOutcome<T> {
  /// Claimed from a queued sender.
  Value(T),
  /// Queued; the caller must wait on this slot.
  Queued(Arc<Signal<T>>),
  /// Closed with no queued sender left to drain.
  Closed,
}

impl<T: Send> ChannelShared<T> {
  pub(crate) fn new() -> Self {
    ChannelShared {
      internal: Mutex::new(ChannelState {
        pending_sends: VecDeque::new(),
        pending_recvs: VecDeque::new(),
        select_waiters: VecDeque::new(),
        closed: false,
      }),
    }
  }

  /// Non-blocking send: succeeds only against an already-queued receiver.
  /// No side effects on failure.
  pub(crate) fn try_send_core(&self, item: T) -> Result<(), TrySendError<T>> {
    let mut item = item;
    loop {
      let slot;
      {
        let mut guard = self.internal.lock();
        if guard.closed {
          return Err(TrySendError::Closed(item));
        }
        match guard.pending_recvs.pop_front() {
          Some(s) => slot = s,
          None => return Err(TrySendError::Full(item)),
        }
      }
      match slot.complete(item) {
        Ok(()) => return Ok(()),
        // The slot resolved out from under us; take the value back and match
        // the next receiver.
        Err(returned) => item = returned,
      }
    }
  }

  /// Non-blocking receive: succeeds only against an already-queued sender.
  /// Queued senders remain claimable after close.
  pub(crate) fn try_recv_core(&self) -> Result<T, TryRecvError> {
    let send;
    {
      let mut guard = self.internal.lock();
      match guard.pending_sends.pop_front() {
        Some(s) => send = s,
        None if guard.closed => return Err(TryRecvError::Closed),
        None => return Err(TryRecvError::Empty),
      }
    }
    let PendingSend { item, delivered } = send;
    let _ = delivered.complete(());
    Ok(item)
  }

  /// Commits a send: matches a queued receiver if one exists, otherwise wakes
  /// the oldest live select waiter and queues the value.
  pub(crate) fn send_core(&self, item: T) -> SendOutcome<T> {
    let mut item = item;
    loop {
      let slot;
      {
        let mut guard = self.internal.lock();
        if guard.closed {
          return SendOutcome::Closed(item);
        }
        match guard.pending_recvs.pop_front() {
          Some(s) => slot = s,
          None => {
            // No receiver: hint any blocked select that this channel is
            // about to become ready. Waiters already resolved through
            // another channel are stale; skip them until one transition
            // sticks, so the single wakeup is not swallowed.
            while let Some(waiter) = guard.select_waiters.pop_front() {
              if waiter.complete(()).is_ok() {
                telemetry::log_event("channel::send", "SelectWaiterWoken", None);
                break;
              }
            }
            let delivered = Arc::new(Signal::new());
            guard.pending_sends.push_back(PendingSend {
              item,
              delivered: Arc::clone(&delivered),
            });
            return SendOutcome::Queued(delivered);
          }
        }
      }
      match slot.complete(item) {
        Ok(()) => return SendOutcome::Delivered,
        Err(returned) => item = returned,
      }
    }
  }

  /// Commits a receive: claims a queued sender if one exists (even after
  /// close), otherwise queues a fresh slot on an open channel.
  pub(crate) fn recv_core(&self) -> RecvOutcome<T> {
    let send;
    {
      let mut guard = self.internal.lock();
      match guard.pending_sends.pop_front() {
        Some(s) => send = s,
        None => {
          if guard.closed {
            return RecvOutcome::Closed;
          }
          let slot = Arc::new(Signal::new());
          guard.pending_recvs.push_back(Arc::clone(&slot));
          return RecvOutcome::Queued(slot);
        }
      }
    }
    let PendingSend { item, delivered } = send;
    let _ = delivered.complete(());
    RecvOutcome::Value(item)
  }

  /// Idempotent close: sets the flag and cancels every queued receiver in
  /// FIFO order. Queued senders and the select-waiter queue are left
  /// untouched - senders are never cancelled, and waiters belong to the
  /// select call that registered them.
  pub(crate) fn close_core(&self) {
    let cancelled;
    {
      let mut guard = self.internal.lock();
      if guard.closed {
        return;
      }
      guard.closed = true;
      cancelled = std::mem::take(&mut guard.pending_recvs);
    }
    telemetry::log_event("channel::close", "Closed", None);
    // Resolve outside the lock, oldest first.
    for slot in cancelled {
      slot.cancel();
    }
  }

  pub(crate) fn is_closed_core(&self) -> bool {
    self.internal.lock().closed
  }

  /// Registers a select waiter. If a sender is already queued, the waiter is
  /// resolved immediately instead of queued: this closes the gap between a
  /// select case's failed non-blocking attempt and its registration, and a
  /// resolved waiter sitting in the queue would absorb a later send's single
  /// wakeup.
  pub(crate) fn add_waiter(&self, waiter: &Arc<Signal<()>>) {
    let ready = {
      let mut guard = self.internal.lock();
      if guard.pending_sends.is_empty() {
        guard.select_waiters.push_back(Arc::clone(waiter));
        false
      } else {
        true
      }
    };
    if ready {
      let _ = waiter.complete(());
    }
  }

  /// Removes a select waiter by identity; no-op if it is no longer queued.
  /// O(n) middle removal is acceptable: the waiter list is bounded by the
  /// number of select calls referencing this channel.
  pub(crate) fn remove_waiter(&self, waiter: &Arc<Signal<()>>) {
    let mut guard = self.internal.lock();
    if let Some(pos) = guard
      .select_waiters
      .iter()
      .position(|w| Arc::ptr_eq(w, waiter))
    {
      guard.select_waiters.remove(pos);
    }
  }

  /// Forgets a queued receive slot by identity; no-op if it was already
  /// matched or cancelled. Used when a pending `RecvFuture` is dropped.
  pub(crate) fn forget_recv(&self, slot: &Arc<Signal<T>>) {
    let mut guard = self.internal.lock();
    if let Some(pos) = guard.pending_recvs.iter().position(|s| Arc::ptr_eq(s, slot)) {
      guard.pending_recvs.remove(pos);
    }
  }
}
