//! Fanout - In-Process Event Collection and Fan-Out
//!
//! Producers on arbitrary threads hand payloads to a named [`Collector`];
//! a single dedicated drain worker per collector dequeues in FIFO order and
//! fans each envelope out to every registered [`Handler`] that accepts it.
//!
//! # Architecture
//!
//! - [`Envelope`]: timestamp + originator identity + opaque payload
//! - [`Handler`]: capability contract (`can_handle` / `handle` / `close`)
//! - [`HandlerRegistry`]: ordered fan-out with per-handler fault isolation
//! - [`Collector`]: bounded queue, drain worker thread, Active → Disposed lifecycle
//! - [`CollectorDirectory`]: one collector instance per logical name
//!
//! # Guarantees
//!
//! - Envelopes reach the registry in hand-off completion order (FIFO per collector).
//! - Handlers run in registration order, sequentially, on the drain thread only.
//! - A faulting handler is logged and skipped; it never blocks other handlers
//!   or the worker.
//! - A full queue blocks producers (back-pressure) instead of dropping.
//! - After disposal, hand-off and (un)registration return `false`, queued work
//!   finishes per the configured [`DrainPolicy`], and every handler is closed
//!   exactly once.
//!
//! # Example
//!
//! ```rust,no_run
//! use fanout::{CollectorDirectory, CsvSink};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), fanout::CollectError> {
//! let directory = CollectorDirectory::new();
//! let collector = directory.get("audit")?;
//!
//! let sink = Arc::new(CsvSink::new("/tmp/audit.csv"));
//! collector.register_handler(sink);
//!
//! collector.hand_off("user logged in".to_string());
//! collector.dispose();
//! # Ok(())
//! # }
//! ```

pub mod collector;
pub mod config;
pub mod directory;
pub mod envelope;
pub mod error;
pub mod handler;
pub mod registry;
pub mod sinks;

pub use collector::Collector;
pub use config::{CollectorOptions, DEFAULT_QUEUE_CAPACITY, DrainPolicy, DrainPriority};
pub use directory::CollectorDirectory;
pub use envelope::{Envelope, Payload};
pub use error::CollectError;
pub use handler::{Handler, HandlerError, SharedHandler};
pub use registry::HandlerRegistry;
pub use sinks::{CapturedEvent, CsvSink, MemorySink};
