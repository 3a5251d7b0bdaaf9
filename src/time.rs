// src/time.rs

//! Timer-backed channel factory, for composing timeouts with a select.

use crate::channel::Channel;

use std::thread;
use std::time::{Duration, Instant};

/// Returns a channel that holds exactly one pending timestamp once `duration`
/// has elapsed.
///
/// A dedicated timer thread sleeps for `duration` and then performs a
/// blocking send of the fire time, so the channel becomes ready for
/// `try_recv` - and for a [`Select`](crate::Select) case - as soon as the
/// duration passes. If the timestamp is never consumed, the timer thread
/// stays parked for the life of the process.
pub fn after(duration: Duration) -> Channel<Instant> {
  let channel = Channel::new();
  let producer = channel.clone();
  thread::Builder::new()
    .name("rendezvous-timer".to_owned())
    .spawn(move || {
      thread::sleep(duration);
      // Queues the fire time even if nobody is receiving yet.
      let _ = producer.send(Instant::now());
    })
    .expect("failed to spawn timer thread");
  channel
}
