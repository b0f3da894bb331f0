use crate::{Error, ErrorContext, Result};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotLimiterSnapshot {
    pub capacity: usize,
    pub active: usize,
    pub waiting: usize,
}

#[derive(Debug)]
struct State {
    active: usize,
    waiters: VecDeque<oneshot::Sender<()>>,
}

/// Admission control for in-flight search calls.
///
/// - At most `capacity` slots are held at any time
/// - Excess callers queue and are granted strictly in arrival order
/// - `release` hands the slot straight to the head waiter under the same lock,
///   so a newcomer can never slip in between
pub struct SlotLimiter {
    capacity: usize,
    state: Mutex<State>,
}

impl SlotLimiter {
    /// `capacity` is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(State {
                active: 0,
                waiters: VecDeque::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait for a slot. The slot is held until the returned permit is dropped.
    ///
    /// Dropping the future while it is still queued gives up the place in line;
    /// a grant that raced with the drop is passed on to the next waiter.
    pub async fn acquire(&self) -> Result<SlotPermit<'_>> {
        let rx = {
            let mut st = self.lock();
            if st.active < self.capacity {
                st.active += 1;
                trace!(active = st.active, "slot granted immediately");
                return Ok(SlotPermit { limiter: self });
            }
            // Drop handles of waiters that were cancelled since the last release.
            st.waiters.retain(|tx| !tx.is_closed());
            let (tx, rx) = oneshot::channel();
            st.waiters.push_back(tx);
            trace!(waiting = st.waiters.len(), "slot queued");
            rx
        };

        let mut waiter = Waiter {
            limiter: self,
            rx,
            granted: false,
        };
        match (&mut waiter.rx).await {
            Ok(()) => {
                waiter.granted = true;
                trace!("slot granted from queue");
                Ok(SlotPermit { limiter: self })
            }
            Err(_) => Err(Error::runtime_with_context(
                "slot grant handle dropped",
                ErrorContext::new().with_component("slot_limiter"),
            )),
        }
    }

    /// Grant a slot only if one is free right now.
    pub fn try_acquire(&self) -> Option<SlotPermit<'_>> {
        let mut st = self.lock();
        if st.active < self.capacity {
            st.active += 1;
            Some(SlotPermit { limiter: self })
        } else {
            None
        }
    }

    fn release(&self) {
        let mut st = self.lock();
        st.active = st.active.saturating_sub(1);
        while let Some(tx) = st.waiters.pop_front() {
            st.active += 1;
            if tx.send(()).is_ok() {
                trace!(active = st.active, "slot handed to next waiter");
                return;
            }
            // receiver gone: that waiter was cancelled, try the next one
            st.active -= 1;
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn active(&self) -> usize {
        self.lock().active
    }

    pub fn waiting(&self) -> usize {
        self.lock().waiters.iter().filter(|tx| !tx.is_closed()).count()
    }

    pub fn snapshot(&self) -> SlotLimiterSnapshot {
        let st = self.lock();
        SlotLimiterSnapshot {
            capacity: self.capacity,
            active: st.active,
            waiting: st.waiters.iter().filter(|tx| !tx.is_closed()).count(),
        }
    }
}

impl std::fmt::Debug for SlotLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snap = self.snapshot();
        f.debug_struct("SlotLimiter")
            .field("capacity", &snap.capacity)
            .field("active", &snap.active)
            .field("waiting", &snap.waiting)
            .finish()
    }
}

/// A held slot. Dropping it releases the slot.
#[must_use = "the slot is released as soon as the permit is dropped"]
pub struct SlotPermit<'a> {
    limiter: &'a SlotLimiter,
}

impl Drop for SlotPermit<'_> {
    fn drop(&mut self) {
        self.limiter.release();
    }
}

impl std::fmt::Debug for SlotPermit<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotPermit").finish_non_exhaustive()
    }
}

struct Waiter<'a> {
    limiter: &'a SlotLimiter,
    rx: oneshot::Receiver<()>,
    granted: bool,
}

impl Drop for Waiter<'_> {
    fn drop(&mut self) {
        if self.granted {
            return;
        }
        // Refuse future grants, then hand back one that already arrived.
        self.rx.close();
        if self.rx.try_recv().is_ok() {
            self.limiter.release();
        }
    }
}
