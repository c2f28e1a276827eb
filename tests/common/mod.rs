//! Shared test fixtures: capturing sinks and unique temp paths.

#![allow(dead_code)]

use hotlog::{LogEvent, Sink, SinkCore};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// Counts and captures every admitted event; optionally sleeps per event to
/// simulate a slow sink and build queue pressure.
pub struct CountingSink {
    core: SinkCore,
    count: AtomicUsize,
    lines: Mutex<Vec<String>>,
    seqs: Mutex<Vec<u64>>,
    delay: Option<Duration>,
}

impl CountingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            core: SinkCore::new(),
            count: AtomicUsize::new(0),
            lines: Mutex::new(Vec::new()),
            seqs: Mutex::new(Vec::new()),
            delay: None,
        })
    }

    pub fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            core: SinkCore::new(),
            count: AtomicUsize::new(0),
            lines: Mutex::new(Vec::new()),
            seqs: Mutex::new(Vec::new()),
            delay: Some(delay),
        })
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn seqs(&self) -> Vec<u64> {
        self.seqs.lock().unwrap().clone()
    }
}

impl Sink for CountingSink {
    fn core(&self) -> &SinkCore {
        &self.core
    }

    fn log(&self, event: &LogEvent) {
        if !self.core.admits(event) {
            return;
        }
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        self.lines.lock().unwrap().push(self.core.render(event));
        self.seqs.lock().unwrap().push(event.seq);
        self.count.fetch_add(1, Ordering::Relaxed);
    }
}

/// Unique file path so parallel tests never contend for the same file
pub fn unique_log_path(prefix: &str) -> PathBuf {
    std::env::temp_dir().join(format!("hotlog_{prefix}_{}.log", Uuid::new_v4()))
}

/// Unique directory path for directory-based sinks
pub fn unique_log_dir(prefix: &str) -> PathBuf {
    std::env::temp_dir().join(format!("hotlog_{prefix}_{}", Uuid::new_v4()))
}
