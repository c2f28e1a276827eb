// SPDX-License-Identifier: Apache-2.0 OR MIT
// Sink contract and the copy-on-write sink set

use crate::event::LogEvent;
use crate::level::Level;
use crate::pattern;
use arc_swap::ArcSwap;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// An event consumer (console, file, test capture).
///
/// Sinks own their state behind `&self`; implementations are shared across
/// producer, worker, and pool threads via `Arc`. The configuration surface
/// (pattern, threshold, thread-safety hint) lives in a [`SinkCore`] each
/// implementation embeds, so only `log` (and `flush`, when buffering) need
/// to be written per sink.
pub trait Sink: Send + Sync {
    /// Shared configuration plumbing for this sink
    fn core(&self) -> &SinkCore;

    /// Consume one event. Implementations re-check their own threshold and
    /// swallow I/O errors; emission must never fail observably.
    fn log(&self, event: &LogEvent);

    /// Flush buffered output. Default: nothing buffered.
    fn flush(&self) {}

    fn set_pattern(&self, pattern: &str) {
        self.core().set_pattern(pattern);
    }

    fn set_level(&self, level: Level) {
        self.core().set_level(level);
    }

    fn set_thread_safe(&self, enabled: bool) {
        self.core().set_thread_safe(enabled);
    }

    fn level_threshold(&self) -> Level {
        self.core().level()
    }
}

/// Per-sink configuration state shared by all sink implementations.
pub struct SinkCore {
    pattern: Mutex<String>,
    level: AtomicU8,
    thread_safe: AtomicBool,
}

impl SinkCore {
    pub fn new() -> Self {
        Self {
            pattern: Mutex::new("[{date} {time}.{ms}][{lvl}][{name}] {msg}".to_string()),
            level: AtomicU8::new(Level::Trace.as_u8()),
            thread_safe: AtomicBool::new(true),
        }
    }

    pub fn set_pattern(&self, pattern: &str) {
        let mut current = self
            .pattern
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        pattern.clone_into(&mut current);
    }

    pub fn set_level(&self, level: Level) {
        self.level.store(level.as_u8(), Ordering::Relaxed);
    }

    pub fn level(&self) -> Level {
        Level::from_u8(self.level.load(Ordering::Relaxed)).unwrap_or(Level::Trace)
    }

    pub fn set_thread_safe(&self, enabled: bool) {
        self.thread_safe.store(enabled, Ordering::Relaxed);
    }

    pub fn thread_safe(&self) -> bool {
        self.thread_safe.load(Ordering::Relaxed)
    }

    /// True when `event` meets this sink's threshold
    #[inline]
    pub fn admits(&self, event: &LogEvent) -> bool {
        event.level.as_u8() >= self.level.load(Ordering::Relaxed)
    }

    /// Render `event` with this sink's current pattern
    pub fn render(&self, event: &LogEvent) -> String {
        let pattern = self
            .pattern
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        pattern::render(&pattern, event)
    }
}

impl Default for SinkCore {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) type SinkList = Vec<Arc<dyn Sink>>;

/// Copy-on-write set of active sinks.
///
/// Readers load the current snapshot atomically and never block; updates
/// rebuild the list under the admin lock and publish with an atomic store.
/// Old snapshots are reclaimed when the last reader drops its Arc.
pub(crate) struct SinkSet {
    current: ArcSwap<SinkList>,
    admin: Mutex<()>,
}

impl SinkSet {
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(SinkList::new()),
            admin: Mutex::new(()),
        }
    }

    /// Load the current snapshot
    #[inline]
    pub fn load(&self) -> Arc<SinkList> {
        self.current.load_full()
    }

    /// Append a sink, publishing a new snapshot. Returns the new count.
    pub fn add(&self, sink: Arc<dyn Sink>) -> usize {
        let _admin = self.admin.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = (**self.current.load()).clone();
        next.push(sink);
        let count = next.len();
        self.current.store(Arc::new(next));
        count
    }

    /// Run `f` over the current snapshot under the admin lock, so that a
    /// concurrent `add` cannot publish a sink that misses the update.
    pub fn for_each_locked(&self, f: impl Fn(&Arc<dyn Sink>)) {
        let _admin = self.admin.lock().unwrap_or_else(PoisonError::into_inner);
        for sink in self.current.load().iter() {
            f(sink);
        }
    }
}
