// SPDX-License-Identifier: Apache-2.0 OR MIT
// Logger: admission, routing, consumer worker and lifecycle

use crate::config::{AsyncConfig, LoggerConfig};
use crate::event::{current_thread_id, format_payload, LogEvent, SourceLocation};
use crate::level::Level;
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::pool::ThreadPool;
use crate::queue::DualQueue;
use crate::sink::{Sink, SinkSet};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime};

/// How long the consumer parks when the queue is empty
const CONSUMER_PARK: Duration = Duration::from_millis(100);

struct CaptureFlags {
    timestamp: bool,
    thread_id: bool,
    logger_name: bool,
    source_location: bool,
}

/// State shared between the call-site API, the consumer worker and the
/// sink pool.
struct Shared {
    name: String,
    level: AtomicU8,
    flush_on_level: AtomicU8,
    pattern: Mutex<String>,
    capture: CaptureFlags,
    single_threaded: bool,
    parallel_sinks: bool,
    sink_pool_size: usize,
    async_cfg: AsyncConfig,

    sinks: SinkSet,
    pool: OnceLock<ThreadPool>,
    queue: Option<DualQueue<LogEvent>>,
    seq: AtomicU64,
    stop_requested: AtomicBool,
    metrics: Metrics,
}

/// A self-contained event pipeline: admission, an optional bounded
/// two-tier queue with a single consumer worker, and a set of sinks.
///
/// All methods take `&self`; share a logger across threads with `Arc`.
/// Dropping the logger shuts it down (idempotently), draining the queue
/// and flushing every sink.
pub struct Logger {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Logger {
    pub fn new(config: LoggerConfig) -> Self {
        let cfg = config.normalized();

        let queue = cfg
            .async_mode
            .enabled
            .then(|| DualQueue::new(cfg.async_mode.queue_capacity));

        let shared = Arc::new(Shared {
            name: cfg.name,
            level: AtomicU8::new(cfg.level.as_u8()),
            flush_on_level: AtomicU8::new(cfg.flush_on_level.as_u8()),
            pattern: Mutex::new(cfg.pattern),
            capture: CaptureFlags {
                timestamp: cfg.capture_timestamp,
                thread_id: cfg.capture_thread_id,
                logger_name: cfg.capture_logger_name,
                source_location: cfg.capture_source_location,
            },
            single_threaded: cfg.single_threaded,
            parallel_sinks: cfg.parallel_sinks,
            sink_pool_size: cfg.sink_pool_size,
            async_cfg: cfg.async_mode,
            sinks: SinkSet::new(),
            pool: OnceLock::new(),
            queue,
            seq: AtomicU64::new(0),
            stop_requested: AtomicBool::new(false),
            metrics: Metrics::default(),
        });

        let worker = shared.queue.is_some().then(|| {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name("hotlog-worker".to_string())
                .spawn(move || worker_loop(&shared))
                .expect("failed to spawn log worker thread")
        });

        Self {
            shared,
            worker: Mutex::new(worker),
        }
    }

    /// Add a sink while running. The sink receives the logger's current
    /// pattern and is marked thread-unsafe only in single-threaded mode.
    pub fn add_sink(&self, sink: Arc<dyn Sink>) {
        {
            let pattern = self
                .shared
                .pattern
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            sink.set_pattern(&pattern);
        }
        sink.set_thread_safe(!self.shared.single_threaded);
        let count = self.shared.sinks.add(sink);

        // Sync-mode parallel sinks: the pool is sized lazily, on the first
        // add, to the configured size or the sink count at that moment.
        if !self.shared.async_cfg.enabled && self.shared.parallel_sinks {
            self.shared.pool.get_or_init(|| {
                let size = if self.shared.sink_pool_size != 0 {
                    self.shared.sink_pool_size
                } else {
                    count
                };
                ThreadPool::new(size)
            });
        }
    }

    pub fn set_level(&self, level: Level) {
        self.shared.level.store(level.as_u8(), Ordering::Relaxed);
    }

    pub fn set_flush_on(&self, level: Level) {
        self.shared
            .flush_on_level
            .store(level.as_u8(), Ordering::Relaxed);
    }

    /// Change the pattern for this logger and every currently-added sink
    pub fn set_pattern(&self, pattern: &str) {
        {
            let mut current = self
                .shared
                .pattern
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            pattern.clone_into(&mut current);
        }
        self.shared.sinks.for_each_locked(|sink| sink.set_pattern(pattern));
    }

    /// Emit an event, capturing the caller's file and line.
    ///
    /// The macros ([`crate::log!`] and friends) additionally capture the
    /// enclosing function name and the template for formatter fallback.
    #[track_caller]
    #[inline]
    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        self.shared
            .submit(level, SourceLocation::caller(), "", args);
    }

    /// Emit an event with an explicit call site, so thin wrappers can
    /// forward the real one. `template` is the fallback payload should the
    /// formatter fail.
    #[inline]
    pub fn log_at(&self, level: Level, loc: SourceLocation, template: &str, args: fmt::Arguments<'_>) {
        self.shared.submit(level, loc, template, args);
    }

    #[track_caller]
    #[inline]
    pub fn trace(&self, args: fmt::Arguments<'_>) {
        self.shared
            .submit(Level::Trace, SourceLocation::caller(), "", args);
    }

    #[track_caller]
    #[inline]
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.shared
            .submit(Level::Debug, SourceLocation::caller(), "", args);
    }

    #[track_caller]
    #[inline]
    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.shared
            .submit(Level::Info, SourceLocation::caller(), "", args);
    }

    #[track_caller]
    #[inline]
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.shared
            .submit(Level::Warn, SourceLocation::caller(), "", args);
    }

    #[track_caller]
    #[inline]
    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.shared
            .submit(Level::Error, SourceLocation::caller(), "", args);
    }

    #[track_caller]
    #[inline]
    pub fn critical(&self, args: fmt::Arguments<'_>) {
        self.shared
            .submit(Level::Critical, SourceLocation::caller(), "", args);
    }

    /// Flush every sink in the current snapshot
    pub fn flush(&self) {
        self.shared.flush_all();
    }

    /// Stop the pipeline: no further admissions, drain the queue, join the
    /// worker, shut the pool, flush once. Safe to call repeatedly and from
    /// multiple threads; `Drop` calls it too.
    pub fn shutdown(&self) {
        if self
            .shared
            .stop_requested
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        if let Some(queue) = &self.shared.queue {
            queue.signal_stop();
        }
        if let Some(worker) = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            let _ = worker.join();
        }
        if let Some(pool) = self.shared.pool.get() {
            pool.shutdown();
        }
        self.shared.flush_all();
    }

    pub fn stats(&self) -> MetricsSnapshot {
        let queue_size = self
            .shared
            .queue
            .as_ref()
            .map_or(0, |q| q.len_relaxed() as u64);
        self.shared.metrics.snapshot(queue_size)
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Shared {
    /// Admission: level gate, metadata capture, payload formatting,
    /// sequence stamp, then routing.
    fn submit(&self, level: Level, loc: SourceLocation, template: &str, args: fmt::Arguments<'_>) {
        if level == Level::Off {
            return;
        }
        if level.as_u8() < self.level.load(Ordering::Relaxed) {
            return;
        }
        if self.stop_requested.load(Ordering::Relaxed) {
            return;
        }

        let event = LogEvent {
            ts: self.capture.timestamp.then(SystemTime::now),
            level,
            tid: self.capture.thread_id.then(current_thread_id),
            name: if self.capture.logger_name {
                self.name.clone()
            } else {
                String::new()
            },
            payload: format_payload(template, args),
            seq: self.seq.fetch_add(1, Ordering::Relaxed),
            loc: if self.capture.source_location {
                loc
            } else {
                SourceLocation::UNKNOWN
            },
        };

        if let Some(queue) = &self.queue {
            let weight = level.weight();
            match queue.try_push(event, weight) {
                Ok(()) => self.metrics.add_enqueued(1),
                Err(event) => {
                    if self.async_cfg.drop_when_full && level < Level::Warn {
                        self.metrics.add_dropped(1);
                    } else if queue.push_blocking(event, weight) {
                        // warn+ degrades to blocking rather than dropping;
                        // a push interrupted by shutdown is not counted.
                        self.metrics.add_enqueued(1);
                    }
                }
            }
            return;
        }

        self.write_event(&event);
        if self.single_threaded {
            self.metrics.add_enqueued(1);
            self.metrics.add_dequeued(1);
        }
        if level.as_u8() >= self.flush_on_level.load(Ordering::Relaxed) {
            self.flush_all();
        }
    }

    /// Synchronous dispatch: inline, or one pool task per sink
    fn write_event(&self, event: &LogEvent) {
        let sinks = self.sinks.load();
        if sinks.is_empty() {
            return;
        }

        if let Some(pool) = self.pool.get() {
            for sink in sinks.iter() {
                let sink = Arc::clone(sink);
                let event = event.clone();
                pool.execute(Box::new(move || {
                    if event.level >= sink.level_threshold() {
                        sink.log(&event);
                    }
                }));
            }
        } else {
            for sink in sinks.iter() {
                dispatch_to(sink, event);
            }
        }
    }

    fn dispatch_batch(&self, batch: &[LogEvent]) {
        let sinks = self.sinks.load();
        if sinks.is_empty() {
            return;
        }
        let flush_on = self.flush_on_level.load(Ordering::Relaxed);
        for event in batch {
            for sink in sinks.iter() {
                dispatch_to(sink, event);
            }
            if event.level.as_u8() >= flush_on {
                for sink in sinks.iter() {
                    flush_sink(sink);
                }
                self.metrics.add_flushed(1);
            }
        }
    }

    fn flush_all(&self) {
        let sinks = self.sinks.load();
        for sink in sinks.iter() {
            flush_sink(sink);
        }
        self.metrics.add_flushed(1);
    }
}

/// Deliver one event to one sink; a panicking sink is contained here.
fn dispatch_to(sink: &Arc<dyn Sink>, event: &LogEvent) {
    if event.level >= sink.level_threshold() {
        let _ = panic::catch_unwind(AssertUnwindSafe(|| sink.log(event)));
    }
}

fn flush_sink(sink: &Arc<dyn Sink>) {
    let _ = panic::catch_unwind(AssertUnwindSafe(|| sink.flush()));
}

/// Consumer worker: batch, dispatch, periodic flush; drain on stop.
fn worker_loop(shared: &Shared) {
    let Some(queue) = &shared.queue else { return };
    let batch_max = shared.async_cfg.batch_max;
    let mut batch: Vec<LogEvent> = Vec::with_capacity(batch_max);
    let mut last_flush = Instant::now();

    while !shared.stop_requested.load(Ordering::Relaxed) {
        batch.clear();
        let n = queue.pop_batch(&mut batch, batch_max);
        if n == 0 {
            queue.wait_for_data(CONSUMER_PARK);
        } else {
            shared.metrics.add_dequeued(n as u64);
            shared.dispatch_batch(&batch);
        }

        if last_flush.elapsed() >= shared.async_cfg.flush_every {
            shared.flush_all();
            last_flush = Instant::now();
        }
        shared.metrics.set_queue_size(queue.len_relaxed() as u64);
    }

    // Drain everything producers managed to enqueue, then flush once.
    loop {
        batch.clear();
        let n = queue.pop_batch(&mut batch, batch_max);
        if n == 0 {
            break;
        }
        shared.metrics.add_dequeued(n as u64);
        shared.dispatch_batch(&batch);
    }
    shared.flush_all();
    shared.metrics.set_queue_size(0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::SinkCore;

    struct CaptureSink {
        core: SinkCore,
        lines: Mutex<Vec<String>>,
    }

    impl CaptureSink {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                core: SinkCore::new(),
                lines: Mutex::new(Vec::new()),
            })
        }

        fn lines(&self) -> Vec<String> {
            self.lines.lock().unwrap().clone()
        }
    }

    impl Sink for CaptureSink {
        fn core(&self) -> &SinkCore {
            &self.core
        }

        fn log(&self, event: &LogEvent) {
            if !self.core.admits(event) {
                return;
            }
            self.lines.lock().unwrap().push(self.core.render(event));
        }
    }

    fn msg_only(level: Level) -> LoggerConfig {
        LoggerConfig {
            level,
            pattern: "{msg}".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_sync_delivers_admitted_events() {
        let logger = Logger::new(LoggerConfig {
            parallel_sinks: false,
            ..msg_only(Level::Info)
        });
        let sink = CaptureSink::new();
        logger.add_sink(sink.clone());

        for _ in 0..10 {
            logger.info(format_args!("x"));
        }
        assert_eq!(sink.lines().len(), 10);
        assert_eq!(sink.lines()[0], "x");
        assert_eq!(logger.stats().dropped, 0);
    }

    #[test]
    fn test_level_gate_filters_below_minimum() {
        let logger = Logger::new(LoggerConfig {
            parallel_sinks: false,
            ..msg_only(Level::Warn)
        });
        let sink = CaptureSink::new();
        logger.add_sink(sink.clone());

        for _ in 0..10 {
            logger.info(format_args!("x"));
        }
        assert!(sink.lines().is_empty());
        assert_eq!(logger.stats().dropped, 0);
    }

    #[test]
    fn test_off_threshold_admits_nothing() {
        let logger = Logger::new(LoggerConfig {
            parallel_sinks: false,
            ..msg_only(Level::Off)
        });
        let sink = CaptureSink::new();
        logger.add_sink(sink.clone());

        logger.critical(format_args!("still filtered"));
        assert!(sink.lines().is_empty());
    }

    #[test]
    fn test_off_level_submission_is_discarded() {
        let logger = Logger::new(LoggerConfig {
            parallel_sinks: false,
            ..msg_only(Level::Trace)
        });
        let sink = CaptureSink::new();
        logger.add_sink(sink.clone());

        logger.log(Level::Off, format_args!("nope"));
        assert!(sink.lines().is_empty());
    }

    #[test]
    fn test_set_level_at_runtime() {
        let logger = Logger::new(LoggerConfig {
            parallel_sinks: false,
            ..msg_only(Level::Error)
        });
        let sink = CaptureSink::new();
        logger.add_sink(sink.clone());

        logger.info(format_args!("dropped by gate"));
        logger.set_level(Level::Trace);
        logger.info(format_args!("admitted"));
        assert_eq!(sink.lines(), vec!["admitted"]);
    }

    #[test]
    fn test_flush_on_level_in_sync_mode() {
        let logger = Logger::new(LoggerConfig {
            parallel_sinks: false,
            ..msg_only(Level::Info)
        });
        logger.add_sink(CaptureSink::new());

        let flushed_before = logger.stats().flushed;
        logger.info(format_args!("no flush"));
        assert_eq!(logger.stats().flushed, flushed_before);
        logger.error(format_args!("flushes"));
        assert_eq!(logger.stats().flushed, flushed_before + 1);
    }

    #[test]
    fn test_single_threaded_counts() {
        let logger = Logger::new(LoggerConfig {
            single_threaded: true,
            ..msg_only(Level::Info)
        });
        let sink = CaptureSink::new();
        logger.add_sink(sink.clone());
        assert!(!sink.core().thread_safe());

        logger.info(format_args!("a"));
        logger.info(format_args!("b"));
        let stats = logger.stats();
        assert_eq!(stats.enqueued, 2);
        assert_eq!(stats.dequeued, 2);
        assert_eq!(stats.queue_size, 0);
    }

    #[test]
    fn test_empty_sink_set_is_silent() {
        let logger = Logger::new(msg_only(Level::Info));
        logger.info(format_args!("goes nowhere"));
        logger.flush();
        logger.shutdown();
    }

    #[test]
    fn test_async_roundtrip_and_shutdown() {
        let mut cfg = msg_only(Level::Info);
        cfg.async_mode.enabled = true;
        let logger = Logger::new(cfg);
        let sink = CaptureSink::new();
        logger.add_sink(sink.clone());

        for i in 0..100 {
            logger.info(format_args!("event {i}"));
        }
        logger.shutdown();

        let stats = logger.stats();
        assert_eq!(stats.enqueued, 100);
        assert_eq!(stats.dequeued, 100);
        assert_eq!(stats.dropped, 0);
        assert_eq!(stats.queue_size, 0);
        assert_eq!(sink.lines().len(), 100);
    }

    #[test]
    fn test_shutdown_is_idempotent_and_final() {
        let mut cfg = msg_only(Level::Info);
        cfg.async_mode.enabled = true;
        let logger = Logger::new(cfg);
        let sink = CaptureSink::new();
        logger.add_sink(sink.clone());

        logger.info(format_args!("before"));
        logger.shutdown();
        logger.shutdown();

        logger.info(format_args!("after"));
        logger.flush();
        assert_eq!(sink.lines(), vec!["before"]);
        assert_eq!(logger.stats().enqueued, 1);
    }

    #[test]
    fn test_seq_strictly_increasing() {
        struct SeqSink {
            core: SinkCore,
            seqs: Mutex<Vec<u64>>,
        }
        impl Sink for SeqSink {
            fn core(&self) -> &SinkCore {
                &self.core
            }
            fn log(&self, event: &LogEvent) {
                self.seqs.lock().unwrap().push(event.seq);
            }
        }

        let logger = Logger::new(LoggerConfig {
            parallel_sinks: false,
            ..msg_only(Level::Info)
        });
        let sink = Arc::new(SeqSink {
            core: SinkCore::new(),
            seqs: Mutex::new(Vec::new()),
        });
        logger.add_sink(sink.clone());

        for _ in 0..20 {
            logger.info(format_args!("x"));
        }
        logger.warn(format_args!("y"));

        let seqs = sink.seqs.lock().unwrap().clone();
        assert_eq!(seqs.len(), 21);
        assert!(seqs.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_panicking_sink_is_contained() {
        struct PanickingSink {
            core: SinkCore,
        }
        impl Sink for PanickingSink {
            fn core(&self) -> &SinkCore {
                &self.core
            }
            fn log(&self, _event: &LogEvent) {
                panic!("sink exploded");
            }
        }

        let logger = Logger::new(LoggerConfig {
            parallel_sinks: false,
            ..msg_only(Level::Info)
        });
        let bad = Arc::new(PanickingSink {
            core: SinkCore::new(),
        });
        let good = CaptureSink::new();
        logger.add_sink(bad);
        logger.add_sink(good.clone());

        logger.info(format_args!("survives"));
        assert_eq!(good.lines(), vec!["survives"]);
    }
}
