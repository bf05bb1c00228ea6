//! Crate-level error types.
//!
//! Post-disposal rejections are deliberately booleans, not errors (callers
//! check the return value); [`CollectError`] covers the few conditions that
//! genuinely abort an operation, chiefly failure to start a drain worker.

use thiserror::Error;

/// Errors that can occur when creating or operating collectors.
#[derive(Debug, Error)]
pub enum CollectError {
    /// The drain worker thread could not be started. This aborts collector
    /// creation; a collector without its worker would silently queue forever.
    #[error("failed to start drain worker for collector '{name}': {source}")]
    WorkerSpawn {
        /// Name of the collector being created.
        name: String,
        /// Underlying spawn failure.
        #[source]
        source: std::io::Error,
    },
}
