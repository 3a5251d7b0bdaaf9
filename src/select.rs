// src/select.rs

//! Waits on the first-ready of several channels and runs exactly one handler.
//!
//! A [`Select`] is an ordered list of cases, each pairing one channel with one
//! handler. [`execute`](Select::execute) scans the cases in registration
//! order with non-blocking receives; the first ready case wins, its handler
//! runs with the consumed value, and the call returns. When nothing is ready
//! the select registers a single waiter with every case's channel and
//! suspends until one of them hints that it changed - a hint only, so every
//! retry re-verifies from scratch.
//!
//! Registration order is case priority, re-applied fresh on every scan: an
//! earlier case always beats a later one when both are ready at scan time.
//!
//! ```
//! use rendezvous::{Channel, Select};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let data: Channel<u32> = Channel::new();
//! let timeout = rendezvous::time::after(Duration::from_millis(10));
//!
//! let outcome = Select::new()
//!   .recv(&data, |v| format!("got {v}"))
//!   .recv(&timeout, |_| "timed out".to_owned())
//!   .execute()
//!   .await;
//! assert_eq!(outcome, "timed out");
//! # }
//! ```

use crate::channel::Channel;
use crate::internal::signal::Signal;
use crate::telemetry;

use std::fmt;
use std::future::{self, Future};
use std::pin::Pin;
use std::sync::Arc;

type CaseFuture<'a, R> = Pin<Box<dyn Future<Output = R> + Send + 'a>>;

/// One registered case, type-erased behind the three capabilities the select
/// loop needs: fire if ready, register a waiter, unregister a waiter. Built
/// once per case from closures capturing the typed channel and handler.
struct Case<'a, R> {
  try_fire: Box<dyn FnMut() -> Option<CaseFuture<'a, R>> + Send + 'a>,
  add_waiter: Box<dyn Fn(&Arc<Signal<()>>) + Send + 'a>,
  remove_waiter: Box<dyn Fn(&Arc<Signal<()>>) + Send + 'a>,
}

/// An ordered set of (channel, handler) cases; see the module docs.
///
/// `R` is the common output type of all handlers, returned by
/// [`execute`](Select::execute).
pub struct Select<'a, R = ()> {
  cases: Vec<Case<'a, R>>,
}

impl<R> fmt::Debug for Select<'_, R> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Select")
      .field("cases", &self.cases.len())
      .finish()
  }
}

impl<'a, R: Send + 'a> Default for Select<'a, R> {
  fn default() -> Self {
    Self::new()
  }
}

impl<'a, R: Send + 'a> Select<'a, R> {
  /// Creates an empty select. Cases are tried in the order they are added.
  pub fn new() -> Self {
    Select { cases: Vec::new() }
  }

  /// Adds a case with a synchronous handler, run with the consumed value if
  /// this case wins.
  pub fn recv<T, F>(mut self, channel: &'a Channel<T>, handler: F) -> Self
  where
    T: Send,
    F: FnOnce(T) -> R + Send + 'a,
  {
    let mut handler = Some(handler);
    self.push_case(
      Box::new(move || {
        channel.try_recv().ok().map(|item| {
          // At most one case fires per `execute`, which consumes the select.
          let handler = handler.take().expect("select case fired twice");
          let output = handler(item);
          Box::pin(future::ready(output)) as CaseFuture<'a, R>
        })
      }),
      channel,
    );
    self
  }

  /// Adds a case with a suspending handler, awaited with the consumed value
  /// if this case wins.
  pub fn recv_async<T, F, Fut>(mut self, channel: &'a Channel<T>, handler: F) -> Self
  where
    T: Send,
    F: FnOnce(T) -> Fut + Send + 'a,
    Fut: Future<Output = R> + Send + 'a,
  {
    let mut handler = Some(handler);
    self.push_case(
      Box::new(move || {
        channel.try_recv().ok().map(|item| {
          let handler = handler.take().expect("select case fired twice");
          Box::pin(handler(item)) as CaseFuture<'a, R>
        })
      }),
      channel,
    );
    self
  }

  fn push_case<T: Send>(
    &mut self,
    try_fire: Box<dyn FnMut() -> Option<CaseFuture<'a, R>> + Send + 'a>,
    channel: &'a Channel<T>,
  ) {
    self.cases.push(Case {
      try_fire,
      add_waiter: Box::new(move |w| channel.add_waiter(w)),
      remove_waiter: Box::new(move |w| channel.remove_waiter(w)),
    });
  }

  /// Runs the scan-then-wait loop until exactly one case fires, and returns
  /// that handler's output. Exactly one value is consumed per call.
  ///
  /// A handler's panic (or error-valued output) propagates unmodified; any
  /// registered waiters are unregistered before a handler runs.
  ///
  /// # Panics
  ///
  /// Panics if no case was registered - a zero-case select would otherwise
  /// block forever.
  pub async fn execute(mut self) -> R {
    assert!(
      !self.cases.is_empty(),
      "select has no cases and would block forever"
    );

    loop {
      // Scan in registration order; the first ready case wins this pass.
      for case in self.cases.iter_mut() {
        if let Some(fired) = (case.try_fire)() {
          return fired.await;
        }
      }

      // Nothing ready: register one fresh waiter with every case, after the
      // scan, so a send landing in the gap resolves it immediately. The
      // guard unregisters the waiter from every channel on every exit path,
      // including cancellation of this future while suspended - a stale
      // registered waiter would swallow a later send's single wakeup.
      let waiter = Arc::new(Signal::new());
      let registration = Registration::new(&mut self.cases, &waiter);
      let _ = future::poll_fn(|cx| waiter.poll_wait(cx)).await;
      drop(registration);
      telemetry::log_event("select::execute", "Wakeup", None);

      // The wakeup is only a hint: another consumer may have already taken
      // the value, so the next pass re-verifies every case.
    }
  }
}

// Held by exclusive borrow so the suspended `execute` future stays `Send`
// without demanding `Sync` handlers.
struct Registration<'s, 'a, R> {
  cases: &'s mut Vec<Case<'a, R>>,
  waiter: &'s Arc<Signal<()>>,
}

impl<'s, 'a, R> Registration<'s, 'a, R> {
  fn new(cases: &'s mut Vec<Case<'a, R>>, waiter: &'s Arc<Signal<()>>) -> Self {
    for case in cases.iter() {
      (case.add_waiter)(waiter);
    }
    telemetry::log_event("select::execute", "WaiterRegistered", None);
    Registration { cases, waiter }
  }
}

impl<R> Drop for Registration<'_, '_, R> {
  fn drop(&mut self) {
    for case in self.cases.iter() {
      (case.remove_waiter)(self.waiter);
    }
  }
}
