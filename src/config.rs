// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Logger configuration.
//!
//! Plain serde value objects; every field has a default so partial
//! configuration files work. Normalization (clamping, mode exclusions)
//! happens once at logger construction via [`LoggerConfig::normalized`].

use crate::level::Level;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default render pattern applied to sinks added through a logger
pub const DEFAULT_PATTERN: &str = "[{date} {time}.{ms}][{lvl}][tid={tid}][{name}] {msg}";

/// Per-logger configuration, captured at construction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggerConfig {
    /// Logger name, rendered by the `{name}` token
    pub name: String,

    /// Minimum admitted level; `off` admits nothing
    pub level: Level,

    /// Single-threaded mode: no worker thread, no sink pool, sinks are
    /// configured thread-unsafe. Emitting from multiple threads in this
    /// mode is tolerated but unordered.
    pub single_threaded: bool,

    /// Pattern tokens: {ts} {date} {time} {ms} {lvl} {tid} {name} {msg}
    /// {file} {line} {func}. The special pattern "{json}" emits a
    /// structured JSON line.
    pub pattern: String,

    /// Metadata capture controls. These matter in tight loops: with a
    /// "{msg}" pattern and sinks that ignore metadata, disabling them
    /// removes all per-call capture work.
    pub capture_timestamp: bool,
    pub capture_thread_id: bool,
    pub capture_logger_name: bool,
    pub capture_source_location: bool,

    /// Synchronous paths flush all sinks after any event at or above this
    /// level; the async worker does the same from its batch loop.
    pub flush_on_level: Level,

    #[serde(rename = "async")]
    pub async_mode: AsyncConfig,

    /// Fan sink writes out to a thread pool (sync mode only)
    pub parallel_sinks: bool,

    /// Worker count for the sink pool; 0 means "current sink count"
    pub sink_pool_size: usize,
}

/// Async (queued) mode configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AsyncConfig {
    pub enabled: bool,

    /// Total capacity across both tiers; rounded up per-ring to a power
    /// of two
    pub queue_capacity: usize,

    /// Upper bound on events dispatched per consumer wakeup
    pub batch_max: usize,

    /// Periodic flush interval for the consumer worker
    #[serde(rename = "flush_every_ms", with = "duration_ms")]
    pub flush_every: Duration,

    /// When the queue is full: true drops trace/debug/info and blocks for
    /// warn+; false blocks all producers
    pub drop_when_full: bool,

    /// Accepted for compatibility; the two-tier queue is always in effect
    pub weighted_queue: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            level: Level::Info,
            single_threaded: false,
            pattern: DEFAULT_PATTERN.to_string(),
            capture_timestamp: true,
            capture_thread_id: true,
            capture_logger_name: true,
            capture_source_location: true,
            flush_on_level: Level::Error,
            async_mode: AsyncConfig::default(),
            parallel_sinks: true,
            sink_pool_size: 0,
        }
    }
}

impl Default for AsyncConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            queue_capacity: 1 << 14,
            batch_max: 256,
            flush_every: Duration::from_millis(500),
            drop_when_full: true,
            weighted_queue: true,
        }
    }
}

impl LoggerConfig {
    /// Apply construction-time normalization:
    /// - single-threaded mode forces async and parallel sinks off
    /// - a literal "{msg}" pattern forces all capture flags off
    /// - zero capacities and batch sizes are clamped to 1
    pub(crate) fn normalized(mut self) -> Self {
        if self.single_threaded {
            self.async_mode.enabled = false;
            self.parallel_sinks = false;
        }
        if self.pattern == "{msg}" {
            self.capture_timestamp = false;
            self.capture_thread_id = false;
            self.capture_logger_name = false;
            self.capture_source_location = false;
        }
        if self.async_mode.queue_capacity == 0 {
            self.async_mode.queue_capacity = 1;
        }
        if self.async_mode.batch_max == 0 {
            self.async_mode.batch_max = 1;
        }
        self
    }
}

/// Serialize `Duration` as integer milliseconds
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
