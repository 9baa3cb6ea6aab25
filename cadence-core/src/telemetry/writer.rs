//! Append-only JSONL sink.
//!
//! The pipeline keeps two separate files for two separate audiences: an
//! `events.jsonl` structured-logging stream (one line per pipeline event,
//! meant for grepping during an incident) and a `telemetry.jsonl` metrics
//! stream (latency/decision records, meant for offline analysis). Both are
//! the same underlying sink type, constructed twice and injected explicitly
//! into whichever stage produces that kind of record — there is no global
//! telemetry singleton (see the design note this carries forward).

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::Serialize;

use crate::error::Result;

pub struct TelemetryWriter {
    path: PathBuf,
    file: Mutex<BufWriter<File>>,
}

impl TelemetryWriter {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(BufWriter::new(file)),
        })
    }

    /// Serialize `record` to one JSON line and append it, flushing
    /// immediately — telemetry durability matters more than write
    /// throughput here, and volumes are low (one line per pipeline event).
    pub fn write_line<T: Serialize>(&self, record: &T) -> Result<()> {
        let line = serde_json::to_string(record)?;
        let mut file = self.file.lock();
        writeln!(file, "{line}")?;
        file.flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
