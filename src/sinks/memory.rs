//! In-memory capturing sink.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::envelope::{Envelope, Payload};
use crate::handler::{Handler, HandlerError};

/// One captured envelope.
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    /// Hand-off timestamp.
    pub ts: DateTime<Utc>,
    /// Producing thread's identity.
    pub originator: String,
    /// Payload rendered as text (see [`Envelope::payload_text`]).
    pub payload: String,
}

/// Sink that records every accepted envelope in memory.
///
/// Intended for tests and diagnostics. [`MemorySink::wait_for`] lets a test
/// wait for the drain worker to deliver a given number of envelopes without
/// resorting to sleeps.
pub struct MemorySink {
    records: Mutex<Vec<CapturedEvent>>,
    delivered: Condvar,
    closes: AtomicUsize,
    filter: Option<Box<dyn Fn(&dyn Payload) -> bool + Send + Sync>>,
}

impl std::fmt::Debug for MemorySink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySink")
            .field("records", &self.records().len())
            .field("closes", &self.close_count())
            .finish_non_exhaustive()
    }
}

impl MemorySink {
    /// A sink that accepts every payload.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            records: Mutex::new(Vec::new()),
            delivered: Condvar::new(),
            closes: AtomicUsize::new(0),
            filter: None,
        })
    }

    /// A sink that accepts only payloads matching `filter`.
    pub fn accepting<F>(filter: F) -> Arc<Self>
    where
        F: Fn(&dyn Payload) -> bool + Send + Sync + 'static,
    {
        Arc::new(Self {
            records: Mutex::new(Vec::new()),
            delivered: Condvar::new(),
            closes: AtomicUsize::new(0),
            filter: Some(Box::new(filter)),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Vec<CapturedEvent>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of everything captured so far, in delivery order.
    pub fn records(&self) -> Vec<CapturedEvent> {
        self.lock().clone()
    }

    /// How many times `close` has been invoked.
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Wait until at least `count` envelopes have been captured.
    ///
    /// Returns `false` on timeout.
    pub fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let guard = self.lock();
        let (guard, result) = self
            .delivered
            .wait_timeout_while(guard, timeout, |records| records.len() < count)
            .unwrap_or_else(PoisonError::into_inner);
        drop(guard);
        !result.timed_out()
    }
}

impl Handler for MemorySink {
    fn name(&self) -> &str {
        "memory-sink"
    }

    fn can_handle(&self, payload: &dyn Payload) -> bool {
        match &self.filter {
            Some(filter) => filter(payload),
            None => true,
        }
    }

    fn handle(&self, envelope: &Envelope) -> Result<(), HandlerError> {
        self.lock().push(CapturedEvent {
            ts: envelope.ts(),
            originator: envelope.originator().to_string(),
            payload: envelope.payload_text(),
        });
        self.delivered.notify_all();
        Ok(())
    }

    fn close(&self) -> Result<(), HandlerError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
