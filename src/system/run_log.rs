// src/system/run_log.rs

use crate::{constants::LOG_DIR, core::paths, system::executor::SharedSink};
use chrono::Local;
use std::{
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use uuid::Uuid;

/// Generates a run identifier: `YYYYMMDD-HHMMSS-mmm-xxxxxx` (local time, 6 random hex chars).
pub fn new_run_id() -> String {
    let stamp = Local::now().format("%Y%m%d-%H%M%S-%3f");
    let random = Uuid::new_v4();
    let suffix = hex::encode(random.as_bytes().get(..3).unwrap_or_default());
    format!("{stamp}-{suffix}")
}

/// Duplicates every write into two writers.
#[derive(Debug)]
pub struct TeeWriter<A: Write, B: Write> {
    primary: A,
    secondary: B,
}

impl<A: Write, B: Write> TeeWriter<A, B> {
    /// Creates a writer duplicating every write to both sinks.
    pub fn new(primary: A, secondary: B) -> Self {
        Self { primary, secondary }
    }
}

impl<A: Write, B: Write> Write for TeeWriter<A, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.primary.write_all(buf)?;
        self.secondary.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.primary.flush()?;
        self.secondary.flush()
    }
}

/// The per-run transcript file, together with the console+file sink that feeds it.
pub struct RunLog {
    pub run_id: String,
    pub path: PathBuf,
    pub sink: SharedSink,
}

impl std::fmt::Debug for RunLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunLog")
            .field("run_id", &self.run_id)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl RunLog {
    /// Creates `<base>/log/<run_id>.txt` and a sink writing to stdout and that file.
    pub fn create(base: &Path, run_id: &str) -> io::Result<Self> {
        fs::create_dir_all(base.join(LOG_DIR))?;
        let path = paths::run_log_path(base, run_id);
        let file = File::create(&path)?;
        log::debug!("transcript file created at {}", path.display());

        let sink: SharedSink = Arc::new(Mutex::new(TeeWriter::new(io::stdout(), file)));
        Ok(Self {
            run_id: run_id.to_string(),
            path,
            sink,
        })
    }
}
