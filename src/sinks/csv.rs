//! CSV file sink.
//!
//! Accepts every payload and appends `timestamp,originator,payload` as one
//! CSV row per envelope, flushing after each write so a crash loses at most
//! the row being written. The file is opened lazily on first delivery; a
//! header row is written only when the file starts empty.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::envelope::{Envelope, Payload};
use crate::handler::{Handler, HandlerError};

const HEADER: [&str; 3] = ["timestamp", "originator", "payload"];

impl From<::csv::Error> for HandlerError {
    fn from(e: ::csv::Error) -> Self {
        HandlerError::Sink(Box::new(e))
    }
}

/// Handler that writes every envelope to a CSV file.
pub struct CsvSink {
    path: PathBuf,
    writer: Mutex<Option<csv::Writer<File>>>,
    closed: AtomicBool,
}

impl std::fmt::Debug for CsvSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvSink")
            .field("path", &self.path)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl CsvSink {
    /// Create a sink appending to `path`.
    ///
    /// The file is not touched until the first envelope arrives.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    /// The output file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, Option<csv::Writer<File>>> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open the writer if needed, emitting the header for a fresh file.
    fn ensure_writer(
        &self,
        guard: &mut MutexGuard<'_, Option<csv::Writer<File>>>,
    ) -> Result<(), HandlerError> {
        if guard.is_some() {
            return Ok(());
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let needs_header = file.metadata()?.len() == 0;

        let mut writer = csv::Writer::from_writer(file);
        if needs_header {
            writer.write_record(HEADER)?;
            writer.flush()?;
        }
        **guard = Some(writer);
        Ok(())
    }
}

impl Handler for CsvSink {
    fn name(&self) -> &str {
        "csv-sink"
    }

    fn can_handle(&self, _payload: &dyn Payload) -> bool {
        true
    }

    fn handle(&self, envelope: &Envelope) -> Result<(), HandlerError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(HandlerError::Message("csv sink is closed".to_string()));
        }

        let mut guard = self.lock();
        self.ensure_writer(&mut guard)?;
        let writer = guard
            .as_mut()
            .ok_or_else(|| HandlerError::Message("csv writer unavailable".to_string()))?;

        writer.write_record([
            envelope.ts().to_rfc3339().as_str(),
            envelope.originator(),
            envelope.payload_text().as_str(),
        ])?;
        // Flush per row: at-most-line-granularity durability.
        writer.flush()?;
        Ok(())
    }

    fn close(&self) -> Result<(), HandlerError> {
        self.closed.store(true, Ordering::Release);
        if let Some(mut writer) = self.lock().take() {
            writer.flush()?;
        }
        tracing::debug!(path = %self.path.display(), "CSV sink closed");
        Ok(())
    }
}
