// Construction-time errors for file-backed sinks

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced when building a sink.
///
/// Nothing on the emission path returns these: once a sink is constructed,
/// I/O failures during `log` and `flush` are swallowed so that logging can
/// never fail observably at a call site.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to open log file {path}: {source}")]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
