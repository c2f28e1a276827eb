// SPDX-License-Identifier: Apache-2.0 OR MIT
// Convenience macros capturing the full call site (file, line, function)

/// Capture the current call site as a [`crate::SourceLocation`], including
/// the enclosing function's name.
///
/// # Examples
/// ```ignore
/// let loc = hotlog::source_location!();
/// logger.log_at(Level::Info, loc, "forwarded", format_args!("forwarded"));
/// ```
#[macro_export]
macro_rules! source_location {
    () => {{
        fn __hotlog_here() {}
        let name = ::core::any::type_name_of_val(&__hotlog_here);
        $crate::SourceLocation {
            file: ::core::file!(),
            line: ::core::line!(),
            func: name.strip_suffix("::__hotlog_here").unwrap_or(name),
        }
    }};
}

/// Log at an explicit level with full call-site capture
///
/// # Examples
/// ```ignore
/// hotlog::log!(logger, Level::Warn, "queue at {}%", pct);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $fmt:expr $(, $arg:expr)* $(,)?) => {
        $logger.log_at(
            $level,
            $crate::source_location!(),
            $fmt,
            ::core::format_args!($fmt $(, $arg)*),
        )
    };
}

/// Log a trace message with full call-site capture
///
/// # Examples
/// ```ignore
/// hotlog::trace!(logger, "poll iteration {}", n);
/// ```
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log!($logger, $crate::Level::Trace, $($rest)+)
    };
}

/// Log a debug message with full call-site capture
///
/// # Examples
/// ```ignore
/// hotlog::debug!(logger, "parsed header: {:?}", hdr);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log!($logger, $crate::Level::Debug, $($rest)+)
    };
}

/// Log an info message with full call-site capture
///
/// # Examples
/// ```ignore
/// hotlog::info!(logger, "listener started on {}", addr);
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log!($logger, $crate::Level::Info, $($rest)+)
    };
}

/// Log a warning with full call-site capture
///
/// # Examples
/// ```ignore
/// hotlog::warn!(logger, "retrying in {:?}", backoff);
/// ```
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log!($logger, $crate::Level::Warn, $($rest)+)
    };
}

/// Log an error with full call-site capture
///
/// # Examples
/// ```ignore
/// hotlog::error!(logger, "write failed: {}", err);
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log!($logger, $crate::Level::Error, $($rest)+)
    };
}

/// Log a critical message with full call-site capture
///
/// # Examples
/// ```ignore
/// hotlog::critical!(logger, "shutting down: {}", reason);
/// ```
#[macro_export]
macro_rules! critical {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log!($logger, $crate::Level::Critical, $($rest)+)
    };
}
