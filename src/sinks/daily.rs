// Daily file sink: one YYYY-MM-DD.log per local day

use crate::error::{Error, Result};
use crate::event::LogEvent;
use crate::pattern::date_string;
use crate::sink::{Sink, SinkCore};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::SystemTime;

struct DailyState {
    file: Option<BufWriter<File>>,
    current_day: String,
}

/// Appends rendered lines to `dir/YYYY-MM-DD.log`, switching files when an
/// event lands on a new local day. Events without a captured timestamp use
/// the current date.
pub struct DailyFileSink {
    core: SinkCore,
    dir: PathBuf,
    state: Mutex<DailyState>,
}

impl DailyFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| Error::CreateDir {
            path: dir.clone(),
            source,
        })?;

        let today = date_string(Some(SystemTime::now()));
        let file = open_day(&dir, &today)?;

        Ok(Self {
            core: SinkCore::new(),
            dir,
            state: Mutex::new(DailyState {
                file: Some(file),
                current_day: today,
            }),
        })
    }
}

impl Sink for DailyFileSink {
    fn core(&self) -> &SinkCore {
        &self.core
    }

    fn log(&self, event: &LogEvent) {
        if !self.core.admits(event) {
            return;
        }
        let day = date_string(Some(event.ts.unwrap_or_else(SystemTime::now)));
        let line = self.core.render(event);

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if day != state.current_day {
            if let Some(mut file) = state.file.take() {
                let _ = file.flush();
            }
            state.file = open_day(&self.dir, &day).ok();
            state.current_day = day;
        }
        if let Some(file) = state.file.as_mut() {
            let _ = writeln!(file, "{line}");
        }
    }

    fn flush(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(file) = state.file.as_mut() {
            let _ = file.flush();
        }
    }
}

fn open_day(dir: &Path, day: &str) -> Result<BufWriter<File>> {
    let path = dir.join(format!("{day}.log"));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|source| Error::OpenFile { path, source })?;
    Ok(BufWriter::new(file))
}
