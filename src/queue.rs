// SPDX-License-Identifier: Apache-2.0 OR MIT
// Two-tier priority queue: a pair of MPSC rings behind one wait block
//
// Events with weight >= 3 (warn and above) go to a reserved high-priority
// ring so a flood of low-priority events can never starve them. The
// consumer drains high first, then low.

use crate::ring::MpscRing;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::Duration;

/// Weight at or above which events route to the high-priority ring
const HIGH_PRIORITY_WEIGHT: u8 = 3;

/// Slow-path coordination shared by both rings.
///
/// Producers touch it only after a successful push (one wakeup per consumer
/// sleep epoch) or when blocking on a full ring; the fast path never locks.
struct WaitBlock {
    /// Guards nothing; pairs with `not_full` for blocking producers
    not_full_lock: Mutex<()>,
    not_full: Condvar,
    /// Binary wakeup signal for the single consumer
    wake_state: Mutex<bool>,
    wake: Condvar,
    /// Consumer is (probably) parked; producers exchange this to decide
    /// whether a wakeup is worth signalling
    sleeping: AtomicBool,
    stop: AtomicBool,
}

impl WaitBlock {
    fn new() -> Self {
        Self {
            not_full_lock: Mutex::new(()),
            not_full: Condvar::new(),
            wake_state: Mutex::new(false),
            wake: Condvar::new(),
            sleeping: AtomicBool::new(false),
            stop: AtomicBool::new(false),
        }
    }

    /// Release the consumer wakeup (binary: repeated releases coalesce)
    fn release_wake(&self) {
        let mut signaled = self
            .wake_state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *signaled = true;
        self.wake.notify_one();
    }

    /// Wait up to `dur` for a wakeup, consuming it if present
    fn acquire_wake_timeout(&self, dur: Duration) {
        let signaled = self
            .wake_state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let (mut signaled, _timeout) = self
            .wake
            .wait_timeout_while(signaled, dur, |signaled| !*signaled)
            .unwrap_or_else(PoisonError::into_inner);
        *signaled = false;
    }
}

/// Bounded two-tier MPSC queue feeding the consumer worker.
pub(crate) struct DualQueue<T> {
    wait: WaitBlock,
    hi: MpscRing<T>,
    lo: MpscRing<T>,
}

impl<T> DualQueue<T> {
    /// Split `total_capacity` roughly 1:3 between the high- and low-priority
    /// rings (each at least one slot, each rounded up to a power of two).
    pub fn new(total_capacity: usize) -> Self {
        let hi_cap = (total_capacity / 4).max(1);
        let lo_cap = total_capacity.saturating_sub(hi_cap).max(1);
        Self {
            wait: WaitBlock::new(),
            hi: MpscRing::new(hi_cap),
            lo: MpscRing::new(lo_cap),
        }
    }

    /// Push without blocking. Fails when the target ring is full or the
    /// queue has been stopped, returning the element to the caller.
    pub fn try_push(&self, value: T, weight: u8) -> Result<(), T> {
        if self.wait.stop.load(Ordering::Relaxed) {
            return Err(value);
        }

        let result = if weight >= HIGH_PRIORITY_WEIGHT {
            self.hi.try_push(value)
        } else {
            self.lo.try_push(value)
        };

        // Wake the consumer only if it is likely parked; the exchange keeps
        // this to one wakeup per sleep epoch rather than one per push.
        if result.is_ok() && self.wait.sleeping.swap(false, Ordering::Relaxed) {
            self.wait.release_wake();
        }
        result
    }

    /// Push, spinning on short not-full waits until space appears.
    ///
    /// Returns false without enqueueing once stop has been signalled.
    pub fn push_blocking(&self, value: T, weight: u8) -> bool {
        let mut value = value;
        loop {
            if self.wait.stop.load(Ordering::Relaxed) {
                return false;
            }
            match self.try_push(value, weight) {
                Ok(()) => return true,
                Err(back) => value = back,
            }

            let guard = self
                .wait
                .not_full_lock
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let _ = self
                .wait
                .not_full
                .wait_timeout_while(guard, Duration::from_millis(1), |_| {
                    !self.wait.stop.load(Ordering::Relaxed)
                })
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Drain up to `max` elements, high-priority ring first.
    pub fn pop_batch(&self, out: &mut Vec<T>, max: usize) -> usize {
        let mut n = self.hi.pop_batch(out, max);
        if n < max {
            n += self.lo.pop_batch(out, max - n);
        }
        if n > 0 {
            self.wait.not_full.notify_all();
        }
        n
    }

    /// Park the consumer for up to `dur` unless data or stop arrives.
    pub fn wait_for_data(&self, dur: Duration) {
        if self.len_relaxed() > 0 {
            return;
        }
        self.wait.sleeping.store(true, Ordering::Relaxed);
        if self.wait.stop.load(Ordering::Relaxed) {
            self.wait.sleeping.store(false, Ordering::Relaxed);
            return;
        }
        self.wait.acquire_wake_timeout(dur);
        self.wait.sleeping.store(false, Ordering::Relaxed);
    }

    /// Signal shutdown: fail further pushes, wake the consumer and any
    /// blocked producers.
    pub fn signal_stop(&self) {
        self.wait.stop.store(true, Ordering::Relaxed);
        self.wait.release_wake();
        self.wait.not_full.notify_all();
    }

    /// Approximate total occupancy across both tiers
    pub fn len_relaxed(&self) -> usize {
        self.hi.len_relaxed() + self.lo.len_relaxed()
    }
}
