//! Illustrative handler sinks.
//!
//! These are consumers of the core contract, not part of it: any component
//! implementing [`Handler`](crate::Handler) can register with a collector.
//!
//! - [`CsvSink`]: appends one CSV line per envelope, flushing after every
//!   write.
//! - [`MemorySink`]: captures envelopes in memory, for tests and local
//!   inspection.

pub mod csv;
pub mod memory;

pub use self::csv::CsvSink;
pub use self::memory::{CapturedEvent, MemorySink};
