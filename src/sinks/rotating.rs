// SPDX-License-Identifier: Apache-2.0 OR MIT
// Size-rotating file sink: path, path.1 ... path.N

use crate::error::{Error, Result};
use crate::event::LogEvent;
use crate::sink::{Sink, SinkCore};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

struct RotatingState {
    file: Option<BufWriter<File>>,
    bytes: u64,
}

/// Appends rendered lines to `path`, rotating once `max_bytes` is reached:
/// `path.N` is deleted, every `path.i` shifts to `path.i+1`, the live file
/// becomes `path.1` and a fresh `path` is opened.
///
/// Construction errors (directories, open) surface; I/O errors afterwards
/// are swallowed. A failed reopen after rotation leaves the sink silently
/// disabled until the next rotation attempt.
pub struct RotatingFileSink {
    core: SinkCore,
    path: PathBuf,
    max_bytes: u64,
    max_files: usize,
    state: Mutex<RotatingState>,
}

impl RotatingFileSink {
    pub fn new(path: impl Into<PathBuf>, max_bytes: u64, max_files: usize) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| Error::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        let (file, bytes) = open_append(&path)?;

        Ok(Self {
            core: SinkCore::new(),
            path,
            max_bytes,
            max_files: max_files.max(1),
            state: Mutex::new(RotatingState {
                file: Some(file),
                bytes,
            }),
        })
    }

    fn rotate(&self, state: &mut RotatingState) {
        if let Some(mut file) = state.file.take() {
            let _ = file.flush();
        }

        let _ = fs::remove_file(numbered(&self.path, self.max_files));
        for i in (1..self.max_files).rev() {
            let src = numbered(&self.path, i);
            if src.exists() {
                let _ = fs::rename(&src, numbered(&self.path, i + 1));
            }
        }
        let _ = fs::rename(&self.path, numbered(&self.path, 1));

        match open_append(&self.path) {
            Ok((file, bytes)) => {
                state.file = Some(file);
                state.bytes = bytes;
            }
            Err(_) => {
                state.file = None;
                state.bytes = 0;
            }
        }
    }
}

impl Sink for RotatingFileSink {
    fn core(&self) -> &SinkCore {
        &self.core
    }

    fn log(&self, event: &LogEvent) {
        if !self.core.admits(event) {
            return;
        }
        let line = self.core.render(event);

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(file) = state.file.as_mut() else {
            return;
        };
        let _ = writeln!(file, "{line}");
        state.bytes += line.len() as u64 + 1;
        if state.bytes >= self.max_bytes {
            self.rotate(&mut state);
        }
    }

    fn flush(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(file) = state.file.as_mut() {
            let _ = file.flush();
        }
    }
}

fn open_append(path: &Path) -> Result<(BufWriter<File>, u64)> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| Error::OpenFile {
            path: path.to_path_buf(),
            source,
        })?;
    let bytes = file.metadata().map(|m| m.len()).unwrap_or(0);
    Ok((BufWriter::new(file), bytes))
}

fn numbered(path: &Path, i: usize) -> PathBuf {
    PathBuf::from(format!("{}.{}", path.display(), i))
}
