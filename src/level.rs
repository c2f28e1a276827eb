// Log levels and their priority weights

use serde::{Deserialize, Serialize};

/// Log severity levels (0-6, higher is more severe; `Off` disables emission)
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Verbose tracing (per-iteration diagnostics)
    Trace = 0,
    /// Debug-level messages
    Debug = 1,
    /// Informational (state changes, startup)
    Info = 2,
    /// Warning conditions (approaching limits, retries)
    Warn = 3,
    /// Error conditions (failed operations)
    Error = 4,
    /// Critical conditions (imminent shutdown, data loss)
    Critical = 5,
    /// Not a message level: as a threshold it admits nothing
    Off = 6,
}

impl Level {
    /// Get level ordinal as u8 (0-6)
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Get level name as rendered in output
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
            Level::Off => "OFF",
        }
    }

    /// Priority weight used for queue-tier classification.
    ///
    /// Weight >= 3 routes to the reserved high-priority tier.
    #[inline]
    pub const fn weight(self) -> u8 {
        match self {
            Level::Trace => 1,
            Level::Debug => 1,
            Level::Info => 2,
            Level::Warn => 3,
            Level::Error => 4,
            Level::Critical => 5,
            Level::Off => 0,
        }
    }

    /// Create from u8 ordinal (returns None if invalid)
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Level::Trace),
            1 => Some(Level::Debug),
            2 => Some(Level::Info),
            3 => Some(Level::Warn),
            4 => Some(Level::Error),
            5 => Some(Level::Critical),
            6 => Some(Level::Off),
            _ => None,
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
