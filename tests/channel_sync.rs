mod common;
use common::*;

use rendezvous::error::{RecvError, SendError, TryRecvError, TrySendError};
use rendezvous::Channel;

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// Runs producers and consumers over one channel and checks that every sent
/// value is received exactly once.
fn run_rendezvous_test(num_producers: usize, num_consumers: usize, items_per_producer: usize) {
  let ch: Channel<usize> = Channel::new();
  let total_expected = num_producers * items_per_producer;
  let received_set = Arc::new(std::sync::Mutex::new(HashSet::new()));

  let mut consumers = Vec::new();
  for _ in 0..num_consumers {
    let ch = ch.clone();
    let received_set = Arc::clone(&received_set);
    consumers.push(thread::spawn(move || {
      let mut local_count = 0usize;
      loop {
        match ch.recv() {
          Ok(item) => {
            assert!(
              received_set.lock().unwrap().insert(item),
              "duplicate item received"
            );
            local_count += 1;
          }
          Err(RecvError::Cancelled) => break,
        }
      }
      local_count
    }));
  }

  let mut producers = Vec::new();
  for p_id in 0..num_producers {
    let ch = ch.clone();
    producers.push(thread::spawn(move || {
      for i in 0..items_per_producer {
        ch.send(p_id * items_per_producer + i).unwrap();
      }
    }));
  }

  for handle in producers {
    handle.join().expect("producer panicked");
  }
  // Every send has completed, so every value has been claimed; closing now
  // only cancels still-blocked consumers.
  ch.close();

  let mut total_received = 0usize;
  for handle in consumers {
    total_received += handle.join().expect("consumer panicked");
  }

  assert_eq!(total_received, total_expected);
  assert_eq!(received_set.lock().unwrap().len(), total_expected);
}

#[test]
fn handoff_1p_1c() {
  run_rendezvous_test(1, 1, ITEMS_HIGH);
}

#[test]
fn handoff_mp_1c() {
  run_rendezvous_test(4, 1, ITEMS_MEDIUM);
}

#[test]
fn handoff_1p_mc() {
  run_rendezvous_test(1, 4, ITEMS_HIGH);
}

#[test]
fn handoff_mp_mc_contention() {
  run_rendezvous_test(4, 4, ITEMS_MEDIUM);
}

#[test]
fn send_blocks_until_receiver_arrives() {
  let ch: Channel<u32> = Channel::new();
  let delivered = Arc::new(AtomicBool::new(false));

  let sender = {
    let ch = ch.clone();
    let delivered = Arc::clone(&delivered);
    thread::spawn(move || {
      ch.send(1).unwrap();
      delivered.store(true, Ordering::SeqCst);
    })
  };

  settle();
  assert!(!delivered.load(Ordering::SeqCst), "send returned with no receiver");

  assert_eq!(ch.recv(), Ok(1));
  sender.join().unwrap();
  assert!(delivered.load(Ordering::SeqCst));
}

#[test]
fn try_send_without_receiver_returns_value() {
  let ch: Channel<u32> = Channel::new();
  assert_eq!(ch.try_send(5), Err(TrySendError::Full(5)));
  // No side effects: still nothing to receive.
  assert_eq!(ch.try_recv(), Err(TryRecvError::Empty));
}

#[test]
fn try_send_matches_blocked_receiver() {
  let ch: Channel<u32> = Channel::new();
  let receiver = {
    let ch = ch.clone();
    thread::spawn(move || ch.recv())
  };
  settle();
  assert_eq!(ch.try_send(8), Ok(()));
  assert_eq!(receiver.join().unwrap(), Ok(8));
}

#[test]
fn try_recv_claims_queued_sender() {
  let ch: Channel<u32> = Channel::new();
  let sender = {
    let ch = ch.clone();
    thread::spawn(move || ch.send(3))
  };
  settle();
  assert_eq!(ch.try_recv(), Ok(3));
  sender.join().unwrap().unwrap();
  assert_eq!(ch.try_recv(), Err(TryRecvError::Empty));
}

#[test]
fn receivers_are_matched_fifo() {
  let ch: Channel<u32> = Channel::new();

  let r1 = {
    let ch = ch.clone();
    thread::spawn(move || ch.recv())
  };
  settle();
  let r2 = {
    let ch = ch.clone();
    thread::spawn(move || ch.recv())
  };
  settle();

  ch.send(1).unwrap();
  ch.send(2).unwrap();

  assert_eq!(r1.join().unwrap(), Ok(1), "oldest receiver gets the first value");
  assert_eq!(r2.join().unwrap(), Ok(2));
}

#[test]
fn senders_are_matched_fifo() {
  let ch: Channel<u32> = Channel::new();

  let s1 = {
    let ch = ch.clone();
    thread::spawn(move || ch.send(10))
  };
  settle();
  let s2 = {
    let ch = ch.clone();
    thread::spawn(move || ch.send(20))
  };
  settle();

  assert_eq!(ch.recv(), Ok(10), "oldest sender is claimed first");
  assert_eq!(ch.recv(), Ok(20));
  s1.join().unwrap().unwrap();
  s2.join().unwrap().unwrap();
}

#[test]
fn close_is_idempotent() {
  let ch: Channel<u32> = Channel::new();
  assert!(!ch.is_closed());
  ch.close();
  ch.close();
  ch.close();
  assert!(ch.is_closed());
  assert_eq!(ch.send(1), Err(SendError::Closed));
}

#[test]
fn close_cancels_blocked_receiver() {
  let ch: Channel<u32> = Channel::new();
  let receiver = {
    let ch = ch.clone();
    thread::spawn(move || ch.recv())
  };
  settle();
  ch.close();
  assert_eq!(receiver.join().unwrap(), Err(RecvError::Cancelled));
}

#[test]
fn send_after_close_fails_without_queueing() {
  let ch: Channel<u32> = Channel::new();
  ch.close();
  assert_eq!(ch.send(1), Err(SendError::Closed));
  assert_eq!(ch.try_send(2), Err(TrySendError::Closed(2)));
  assert_eq!(ch.try_recv(), Err(TryRecvError::Closed));
}

#[test]
fn queued_sender_survives_close() {
  let ch: Channel<u32> = Channel::new();
  let sender = {
    let ch = ch.clone();
    thread::spawn(move || ch.send(9))
  };
  settle();
  ch.close();

  // The queued value is still claimable after close...
  assert_eq!(ch.try_recv(), Ok(9));
  sender.join().unwrap().unwrap();
  // ...and only then does the channel report closed-and-drained.
  assert_eq!(ch.try_recv(), Err(TryRecvError::Closed));
}

#[test]
fn blocking_recv_drains_queued_sender_after_close() {
  let ch: Channel<u32> = Channel::new();
  let sender = {
    let ch = ch.clone();
    thread::spawn(move || ch.send(7))
  };
  settle();
  ch.close();

  assert_eq!(ch.recv(), Ok(7));
  sender.join().unwrap().unwrap();
  assert_eq!(ch.recv(), Err(RecvError::Cancelled));
}

#[test]
fn values_move_without_copy() {
  let ch: Channel<String> = Channel::new();
  let receiver = {
    let ch = ch.clone();
    thread::spawn(move || ch.recv())
  };
  settle();
  ch.send(String::from("hello")).unwrap();
  assert_eq!(receiver.join().unwrap().unwrap(), "hello");
}
