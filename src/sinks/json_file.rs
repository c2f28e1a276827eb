// JSON-lines file sink

use crate::error::{Error, Result};
use crate::event::LogEvent;
use crate::pattern::render_json;
use crate::sink::{Sink, SinkCore};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write as _};
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

/// Appends one structured JSON record per event, regardless of the
/// configured pattern.
pub struct JsonFileSink {
    core: SinkCore,
    file: Mutex<Option<BufWriter<File>>>,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| Error::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| Error::OpenFile { path, source })?;

        Ok(Self {
            core: SinkCore::new(),
            file: Mutex::new(Some(BufWriter::new(file))),
        })
    }
}

impl Sink for JsonFileSink {
    fn core(&self) -> &SinkCore {
        &self.core
    }

    fn log(&self, event: &LogEvent) {
        if !self.core.admits(event) {
            return;
        }
        let record = render_json(event);
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(file) = file.as_mut() {
            let _ = writeln!(file, "{record}");
        }
    }

    fn flush(&self) {
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(file) = file.as_mut() {
            let _ = file.flush();
        }
    }
}
