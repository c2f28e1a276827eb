// SPDX-License-Identifier: Apache-2.0 OR MIT
// Log event record and call-site metadata capture

use crate::level::Level;
use std::fmt::{self, Write as _};
use std::time::SystemTime;

/// Source location of a logging call site.
///
/// Produced automatically by the logging macros (which also capture the
/// enclosing function name) or by `#[track_caller]` on the method API
/// (file and line only). Wrappers that funnel calls through a helper can
/// forward the real call site via [`crate::Logger::log_at`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: &'static str,
    pub line: u32,
    pub func: &'static str,
}

impl SourceLocation {
    /// Placeholder for events without a captured location
    pub const UNKNOWN: SourceLocation = SourceLocation {
        file: "",
        line: 0,
        func: "",
    };

    /// Capture the caller's file and line (function name is only available
    /// through the macros).
    #[track_caller]
    pub fn caller() -> Self {
        let loc = std::panic::Location::caller();
        SourceLocation {
            file: loc.file(),
            line: loc.line(),
            func: "",
        }
    }

    /// True when this location carries real call-site data
    #[inline]
    pub fn is_known(&self) -> bool {
        !self.file.is_empty()
    }
}

impl Default for SourceLocation {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

/// One logged record, immutable once admitted.
///
/// Fields guarded by a capture flag are `None` (or empty) when capture is
/// disabled; renderers emit an empty token for them.
#[derive(Debug, Clone)]
pub struct LogEvent {
    /// Wall-clock time at admission, if timestamp capture is enabled
    pub ts: Option<SystemTime>,
    pub level: Level,
    /// OS thread id of the emitting thread, if capture is enabled
    pub tid: Option<u64>,
    /// Owning logger's name, empty if capture is disabled
    pub name: String,
    /// Fully formatted message body
    pub payload: String,
    /// Strictly increasing per-logger admission sequence
    pub seq: u64,
    pub loc: SourceLocation,
}

/// Render the call-site template with its arguments.
///
/// A `Display` implementation that reports an error must not lose the
/// event: the payload falls back to the verbatim template string.
pub(crate) fn format_payload(template: &str, args: fmt::Arguments<'_>) -> String {
    if let Some(s) = args.as_str() {
        return s.to_owned();
    }
    let mut out = String::with_capacity(template.len() + 16);
    match out.write_fmt(args) {
        Ok(()) => out,
        Err(_) => template.to_owned(),
    }
}

/// Get the current OS thread id
#[cfg(target_os = "linux")]
pub(crate) fn current_thread_id() -> u64 {
    // SAFETY: gettid has no preconditions and always succeeds.
    unsafe { libc::gettid() as u64 }
}

/// Get a stable per-thread id (process-local ticket, assigned on first use)
#[cfg(not(target_os = "linux"))]
pub(crate) fn current_thread_id() -> u64 {
    use std::sync::atomic::{AtomicU64, Ordering};
    static NEXT: AtomicU64 = AtomicU64::new(1);
    thread_local! {
        static TID: u64 = NEXT.fetch_add(1, Ordering::Relaxed);
    }
    TID.with(|t| *t)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingDisplay;

    impl fmt::Display for FailingDisplay {
        fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
            Err(fmt::Error)
        }
    }

    #[test]
    fn test_format_payload() {
        let out = format_payload("u={}", format_args!("u={}", 7));
        assert_eq!(out, "u=7");
    }

    #[test]
    fn test_format_payload_no_args_fast_path() {
        let out = format_payload("plain", format_args!("plain"));
        assert_eq!(out, "plain");
    }

    #[test]
    fn test_format_payload_falls_back_to_template() {
        let out = format_payload("v={}", format_args!("v={}", FailingDisplay));
        assert_eq!(out, "v={}");
    }

    #[test]
    fn test_thread_id_is_stable_within_thread() {
        let a = current_thread_id();
        let b = current_thread_id();
        assert_eq!(a, b);
        assert_ne!(a, 0);
    }

    #[test]
    fn test_thread_ids_differ_across_threads() {
        let here = current_thread_id();
        let there = std::thread::spawn(current_thread_id).join().unwrap();
        assert_ne!(here, there);
    }

    #[test]
    fn test_caller_location() {
        let loc = SourceLocation::caller();
        assert!(loc.is_known());
        assert!(loc.file.ends_with("event.rs"));
        assert!(loc.line > 0);
        assert!(!SourceLocation::UNKNOWN.is_known());
    }
}
