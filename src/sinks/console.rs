// Stdout sink, optionally ANSI-colored by level

use crate::event::LogEvent;
use crate::level::Level;
use crate::sink::{Sink, SinkCore};
use std::io::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleStyle {
    Plain,
    Color,
}

/// Writes one rendered line per event to stdout.
///
/// The stdout handle carries its own lock, so concurrent writers cannot
/// interleave within a line regardless of the thread-safety hint.
pub struct ConsoleSink {
    core: SinkCore,
    style: ConsoleStyle,
}

impl ConsoleSink {
    pub fn new(style: ConsoleStyle) -> Self {
        Self {
            core: SinkCore::new(),
            style,
        }
    }

    pub fn plain() -> Self {
        Self::new(ConsoleStyle::Plain)
    }

    pub fn color() -> Self {
        Self::new(ConsoleStyle::Color)
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::plain()
    }
}

impl Sink for ConsoleSink {
    fn core(&self) -> &SinkCore {
        &self.core
    }

    fn log(&self, event: &LogEvent) {
        if !self.core.admits(event) {
            return;
        }
        let line = self.core.render(event);
        let mut out = std::io::stdout().lock();
        let _ = match self.style {
            ConsoleStyle::Plain => writeln!(out, "{line}"),
            ConsoleStyle::Color => writeln!(out, "{}{line}\x1b[0m", color_of(event.level)),
        };
    }

    fn flush(&self) {
        let _ = std::io::stdout().lock().flush();
    }
}

fn color_of(level: Level) -> &'static str {
    match level {
        Level::Trace => "\x1b[37m",
        Level::Debug => "\x1b[36m",
        Level::Info => "\x1b[32m",
        Level::Warn => "\x1b[33m",
        Level::Error => "\x1b[31m",
        Level::Critical => "\x1b[1;31m",
        Level::Off => "\x1b[0m",
    }
}
