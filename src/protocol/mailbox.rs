//! Single-slot handoff between the sending and receiving sides of one
//! request/response exchange. One storage cell plus one counting signal;
//! intentionally not a general queue.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

use log::warn;

struct Slot<T> {
    item: Option<T>,
    pending: u32,
}

/// Rendezvous cell holding at most one undelivered item.
///
/// The contract is strict one-to-one pairing: each `put` is matched by
/// exactly one `take` before the next `put`. Handles are cheaply cloneable
/// so the two sides can live in different threads. Concurrent producers or
/// consumers beyond that pairing are out of contract; a violating `put` is
/// logged and overwrites the undrained item rather than corrupting state,
/// and racing `take` calls yield one winner while the rest time out.
pub struct Mailbox<T> {
    inner: Arc<(Mutex<Slot<T>>, Condvar)>,
}

impl<T> Clone for Mailbox<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Mailbox<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new((
                Mutex::new(Slot {
                    item: None,
                    pending: 0,
                }),
                Condvar::new(),
            )),
        }
    }

    /// Store `item` and signal readiness once.
    pub fn put(&self, item: T) {
        let (lock, ready) = &*self.inner;
        let mut slot = lock.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.item.is_some() {
            warn!("mailbox: replacing a response that was never taken");
        }
        slot.item = Some(item);
        slot.pending += 1;
        ready.notify_one();
    }

    /// Block until an item is available or `timeout` elapses. `None` is the
    /// "no response" sentinel; it never raises.
    pub fn take(&self, timeout: Duration) -> Option<T> {
        let (lock, ready) = &*self.inner;
        let slot = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (mut slot, wait) = ready
            .wait_timeout_while(slot, timeout, |slot| slot.pending == 0)
            .unwrap_or_else(PoisonError::into_inner);
        if wait.timed_out() && slot.pending == 0 {
            return None;
        }
        slot.pending -= 1;
        slot.item.take()
    }
}
