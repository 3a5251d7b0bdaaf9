#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]

//! CSP-style unbuffered channels with a fair select primitive.
//!
//! Every [`Channel`] has capacity zero: a send completes only when a receive
//! takes the value, so each matched pair is a synchronous rendezvous. Blocking
//! (`send`/`recv`) and future-based (`send_async`/`recv_async`) callers
//! interoperate on the same channel and are matched strictly
//! first-come-first-served per side.
//!
//! [`Select`] waits on the first-ready of several channels and runs exactly
//! one handler per call, honoring registration order among simultaneously
//! ready cases. Timeouts compose from [`time::after`] plus a select case; the
//! channel itself has no timeout knob.

pub mod channel;
pub mod error;
pub mod select;
pub mod telemetry;
pub mod time;

// Internal plumbing - not part of the public API.
mod internal;

// Public re-exports for convenience.
pub use channel::{Channel, RecvFuture, RecvStream, SendFuture};
pub use error::{RecvError, SendError, TryRecvError, TrySendError};
pub use select::Select;
