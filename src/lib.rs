// SPDX-License-Identifier: Apache-2.0 OR MIT
//! High-throughput embeddable logging.
//!
//! hotlog links into latency-sensitive processes (game loops, trading
//! engines, network services) and routes structured events to pluggable
//! sinks. The hot path is a level gate plus a lock-free push onto a bounded
//! two-tier queue; a single consumer thread batches events out to the sink
//! set, which is an atomically-swapped snapshot so sinks can be added while
//! producers run full speed.
//!
//! # Quick start
//!
//! ```no_run
//! use hotlog::{Logger, LoggerConfig, ConsoleSink};
//! use std::sync::Arc;
//!
//! let mut cfg = LoggerConfig::default();
//! cfg.name = "relay".to_string();
//! cfg.async_mode.enabled = true;
//!
//! let logger = Logger::new(cfg);
//! logger.add_sink(Arc::new(ConsoleSink::plain()));
//!
//! hotlog::info!(logger, "listener up on port {}", 5000);
//! logger.shutdown(); // drains the queue and flushes every sink
//! ```
//!
//! # Delivery guarantees
//!
//! - Events are immutable once admitted and carry a strictly increasing
//!   per-logger sequence number.
//! - Under queue pressure with the drop policy, only trace/debug/info are
//!   ever dropped; warn and above fall back to a blocking push.
//! - Formatting and sink failures are swallowed: logging never fails
//!   observably at a call site. The [`Logger::stats`] counters are the only
//!   place drops and backlog show up.

pub mod config;
mod error;
mod event;
mod level;
mod logger;
#[macro_use]
mod macros;
mod metrics;
mod pattern;
mod pool;
mod queue;
mod ring;
mod sink;
pub mod sinks;

// Public exports
pub use config::{AsyncConfig, LoggerConfig, DEFAULT_PATTERN};
pub use error::{Error, Result};
pub use event::{LogEvent, SourceLocation};
pub use level::Level;
pub use logger::Logger;
pub use metrics::MetricsSnapshot;
pub use pattern::JSON_PATTERN;
pub use sink::{Sink, SinkCore};
pub use sinks::{ConsoleSink, ConsoleStyle, DailyFileSink, JsonFileSink, RotatingFileSink};
