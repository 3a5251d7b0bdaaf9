// Shared constants and helpers for the integration tests.

#![allow(dead_code)]

use std::time::Duration;

pub const ITEMS_MEDIUM: usize = 1_000;
pub const ITEMS_HIGH: usize = 5_000;

/// Long enough for a spawned thread or task to reach its blocking point.
pub const SETTLE: Duration = Duration::from_millis(100);

pub fn settle() {
  std::thread::sleep(SETTLE);
}
