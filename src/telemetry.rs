// src/telemetry.rs

//! Feature-gated diagnostic event log.
//!
//! With the `telemetry` feature enabled, channel and select operations record
//! sequence-numbered events into a global collector that tests and debugging
//! sessions can dump with [`print_telemetry_report`]. Without the feature,
//! every entry point is an inlined no-op.

#[cfg(feature = "telemetry")]
mod enabled {
  use std::fmt;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Mutex;
  use std::thread::{self, ThreadId};
  use std::time::Instant;

  static NEXT_SEQ: AtomicUsize = AtomicUsize::new(0);

  /// One recorded diagnostic event.
  #[derive(Debug, Clone)]
  pub struct TelemetryEvent {
    /// Global sequence number, for a stable chronological order.
    pub seq: usize,
    /// When the event was recorded.
    pub timestamp: Instant,
    /// OS thread that recorded it.
    pub os_thread_id: ThreadId,
    /// Tokio task that recorded it, when inside one.
    pub tokio_task_id: Option<tokio::task::Id>,
    /// Code location, e.g. `channel::close`.
    pub location: &'static str,
    /// Event type, e.g. `Closed` or `WaiterRegistered`.
    pub event_type: &'static str,
    /// Optional human-readable details.
    pub message: Option<String>,
  }

  struct Collector {
    events: Vec<TelemetryEvent>,
    start: Instant,
  }

  lazy_static::lazy_static! {
    static ref COLLECTOR: Mutex<Collector> = Mutex::new(Collector {
      events: Vec::new(),
      start: Instant::now(),
    });
  }

  /// Records one event into the global collector.
  pub fn log_event(location: &'static str, event_type: &'static str, message: Option<String>) {
    let event = TelemetryEvent {
      seq: NEXT_SEQ.fetch_add(1, Ordering::Relaxed),
      timestamp: Instant::now(),
      os_thread_id: thread::current().id(),
      tokio_task_id: tokio::task::try_id(),
      location,
      event_type,
      message,
    };
    if let Ok(mut collector) = COLLECTOR.lock() {
      collector.events.push(event);
    }
  }

  /// Dumps every recorded event to stdout in sequence order.
  pub fn print_telemetry_report() {
    let Ok(collector) = COLLECTOR.lock() else {
      eprintln!("[telemetry] collector mutex poisoned, cannot print report");
      return;
    };
    println!("--- rendezvous telemetry report ({} events) ---", collector.events.len());
    for event in &collector.events {
      let offset = event.timestamp.duration_since(collector.start);
      let task = event
        .tokio_task_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "---".to_owned());
      println!(
        "  +{:<10.6}s [{:<4}] tid:{:<14?} task:{:<5} {:<18} {:<18} {}",
        offset.as_secs_f64(),
        event.seq,
        event.os_thread_id,
        task,
        event.location,
        event.event_type,
        event.message.as_deref().unwrap_or("")
      );
    }
    println!("--- end of report ---");
  }

  /// Discards all recorded events and restarts the clock.
  pub fn clear_telemetry() {
    if let Ok(mut collector) = COLLECTOR.lock() {
      collector.events.clear();
      collector.start = Instant::now();
    }
    NEXT_SEQ.store(0, Ordering::Relaxed);
  }
}

#[cfg(not(feature = "telemetry"))]
mod disabled {
  /// No-op stub; enable the `telemetry` feature to record events.
  #[inline(always)]
  pub fn log_event(
    _location: &'static str,
    _event_type: &'static str,
    _message: Option<String>,
  ) {
  }

  /// No-op stub; enable the `telemetry` feature to record events.
  #[inline(always)]
  pub fn print_telemetry_report() {}

  /// No-op stub; enable the `telemetry` feature to record events.
  #[inline(always)]
  pub fn clear_telemetry() {}
}

#[cfg(feature = "telemetry")]
pub use enabled::{clear_telemetry, log_event, print_telemetry_report, TelemetryEvent};

#[cfg(not(feature = "telemetry"))]
pub use disabled::{clear_telemetry, log_event, print_telemetry_report};
