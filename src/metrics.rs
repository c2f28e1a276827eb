// Per-logger throughput counters

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Internal counters, updated with relaxed atomics on every path.
#[derive(Debug, Default)]
pub(crate) struct Metrics {
    pub dropped: AtomicU64,
    pub enqueued: AtomicU64,
    pub dequeued: AtomicU64,
    pub flushed: AtomicU64,
    pub queue_size: AtomicU64,
}

impl Metrics {
    #[inline]
    pub fn add_dropped(&self, n: u64) {
        self.dropped.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub fn add_enqueued(&self, n: u64) {
        self.enqueued.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub fn add_dequeued(&self, n: u64) {
        self.dequeued.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub fn add_flushed(&self, n: u64) {
        self.flushed.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub fn set_queue_size(&self, n: u64) {
        self.queue_size.store(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self, queue_size: u64) -> MetricsSnapshot {
        MetricsSnapshot {
            dropped: self.dropped.load(Ordering::Relaxed),
            enqueued: self.enqueued.load(Ordering::Relaxed),
            dequeued: self.dequeued.load(Ordering::Relaxed),
            flushed: self.flushed.load(Ordering::Relaxed),
            queue_size,
        }
    }
}

/// Point-in-time view of a logger's counters, as returned by
/// [`crate::Logger::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Events discarded by the drop-when-full policy
    pub dropped: u64,
    /// Events accepted into the queue (or written inline in
    /// single-threaded mode)
    pub enqueued: u64,
    /// Events the consumer worker handed to sinks
    pub dequeued: u64,
    /// Flush passes over the sink set
    pub flushed: u64,
    /// Approximate queue occupancy at snapshot time
    pub queue_size: u64,
}
