// src/internal/signal.rs

//! Tri-state single-assignment completion signal.
//!
//! One `Signal` backs each queued sender (resolved to "delivered"), each
//! queued receiver (resolved to a value, or cancelled on close) and each
//! select waiter (resolved as a bare "re-check your channels" hint).
//!
//! Resolution is idempotent by construction: a select waiter can race between
//! being deregistered from one channel and being resolved through another, so
//! the losing resolution attempt must be a harmless no-op that hands the value
//! back to the caller.
//!
//! The internal lock is a leaf: it is never held while a channel lock is
//! taken, and resolving never runs caller code - it only unparks a thread
//! and/or wakes a registered waker.

use futures_util::task::AtomicWaker;
use parking_lot::Mutex;

use core::task::{Context, Poll};
use std::fmt;
use std::thread::{self, Thread};

enum State<T> {
  /// Unresolved. Holds the handle of a parked blocking waiter, if any.
  Pending(Option<Thread>),
  Resolved(T),
  Cancelled,
  /// A resolved value has been consumed by `wait`/`poll_wait`.
  Consumed,
}

pub(crate) struct Signal<T> {
  state: Mutex<State<T>>,
  waker: AtomicWaker,
}

impl<T> Signal<T> {
  pub(crate) fn new() -> Self {
    Signal {
      state: Mutex::new(State::Pending(None)),
      waker: AtomicWaker::new(),
    }
  }

  /// Idempotent try-resolve. `Ok(())` iff this call performed the
  /// pending-to-resolved transition; otherwise the value is handed back.
  pub(crate) fn complete(&self, value: T) -> Result<(), T> {
    let parked;
    {
      let mut state = self.state.lock();
      match &mut *state {
        State::Pending(thread) => {
          parked = thread.take();
          *state = State::Resolved(value);
        }
        _ => return Err(value),
      }
    }
    if let Some(thread) = parked {
      thread.unpark();
    }
    self.waker.wake();
    Ok(())
  }

  /// Idempotent pending-to-cancelled transition. `true` iff this call
  /// performed it.
  pub(crate) fn cancel(&self) -> bool {
    let parked;
    {
      let mut state = self.state.lock();
      match &mut *state {
        State::Pending(thread) => {
          parked = thread.take();
          *state = State::Cancelled;
        }
        _ => return false,
      }
    }
    if let Some(thread) = parked {
      thread.unpark();
    }
    self.waker.wake();
    true
  }

  /// Blocks the calling thread until the signal resolves. `None` means it was
  /// cancelled.
  pub(crate) fn wait(&self) -> Option<T> {
    loop {
      if let Some(resolved) = self.try_consume_or_register(Some(thread::current())) {
        return resolved;
      }
      // park() tolerates spurious wakeups; the loop re-reads the state.
      thread::park();
    }
  }

  /// Polls for resolution, registering `cx`'s waker while still pending.
  pub(crate) fn poll_wait(&self, cx: &mut Context<'_>) -> Poll<Option<T>> {
    if let Some(resolved) = self.try_consume_or_register(None) {
      return Poll::Ready(resolved);
    }
    self.waker.register(cx.waker());
    // Re-check after registration: a resolver may have fired in the gap and
    // missed the freshly registered waker.
    match self.try_consume_or_register(None) {
      Some(resolved) => Poll::Ready(resolved),
      None => Poll::Pending,
    }
  }

  /// Consumes a resolution if one is present, otherwise stores `parker` for a
  /// later unpark. Outer `None` = still pending; `Some(None)` = cancelled.
  fn try_consume_or_register(&self, parker: Option<Thread>) -> Option<Option<T>> {
    let mut state = self.state.lock();
    match std::mem::replace(&mut *state, State::Consumed) {
      State::Resolved(value) => Some(Some(value)),
      State::Cancelled => {
        // Cancellation is sticky so repeated waits keep observing it.
        *state = State::Cancelled;
        Some(None)
      }
      State::Pending(_) => {
        *state = State::Pending(parker);
        None
      }
      State::Consumed => unreachable!("signal consumed twice"),
    }
  }
}

impl<T> fmt::Debug for Signal<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let state = match &*self.state.lock() {
      State::Pending(_) => "Pending",
      State::Resolved(_) => "Resolved",
      State::Cancelled => "Cancelled",
      State::Consumed => "Consumed",
    };
    f.debug_struct("Signal").field("state", &state).finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use futures_util::task::noop_waker;
  use std::sync::Arc;
  use std::task::Context;
  use std::thread;
  use std::time::Duration;

  #[test]
  fn complete_is_single_assignment() {
    let signal = Signal::new();
    assert_eq!(signal.complete(1), Ok(()));
    assert_eq!(signal.complete(2), Err(2));
    assert!(!signal.cancel());
    assert_eq!(signal.wait(), Some(1));
  }

  #[test]
  fn cancel_is_single_assignment() {
    let signal = Signal::<u32>::new();
    assert!(signal.cancel());
    assert!(!signal.cancel());
    assert_eq!(signal.complete(9), Err(9));
    assert_eq!(signal.wait(), None);
  }

  #[test]
  fn cancellation_is_sticky() {
    let signal = Signal::<u32>::new();
    signal.cancel();
    assert_eq!(signal.wait(), None);
    assert_eq!(signal.wait(), None);
  }

  #[test]
  fn wait_blocks_until_completed() {
    let signal = Arc::new(Signal::new());
    let waiter = {
      let signal = Arc::clone(&signal);
      thread::spawn(move || signal.wait())
    };
    thread::sleep(Duration::from_millis(50));
    assert_eq!(signal.complete(42), Ok(()));
    assert_eq!(waiter.join().unwrap(), Some(42));
  }

  #[test]
  fn wait_unblocks_on_cancel() {
    let signal = Arc::new(Signal::<u32>::new());
    let waiter = {
      let signal = Arc::clone(&signal);
      thread::spawn(move || signal.wait())
    };
    thread::sleep(Duration::from_millis(50));
    assert!(signal.cancel());
    assert_eq!(waiter.join().unwrap(), None);
  }

  #[test]
  fn poll_wait_pending_then_ready() {
    let signal = Signal::new();
    let waker = noop_waker();
    let mut cx = Context::from_waker(&waker);
    assert!(signal.poll_wait(&mut cx).is_pending());
    assert_eq!(signal.complete(7), Ok(()));
    assert_eq!(signal.poll_wait(&mut cx), Poll::Ready(Some(7)));
  }

  #[test]
  fn poll_wait_observes_cancellation() {
    let signal = Signal::<u32>::new();
    let waker = noop_waker();
    let mut cx = Context::from_waker(&waker);
    assert!(signal.poll_wait(&mut cx).is_pending());
    signal.cancel();
    assert_eq!(signal.poll_wait(&mut cx), Poll::Ready(None));
  }
}
