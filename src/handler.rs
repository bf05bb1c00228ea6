//! Handler contract.
//!
//! A [`Handler`] is a pluggable consumer of envelopes: it decides per payload
//! whether it can process it, performs the side effect, and releases its
//! resources on close. Handlers never need to be thread-safe against
//! concurrent `handle` calls from one collector, because dispatch happens on
//! a single drain thread; they do need interior mutability for their own
//! state, since the registry shares them behind `Arc`.

use std::sync::Arc;

use thiserror::Error;

use crate::envelope::{Envelope, Payload};

/// Errors that can occur inside a handler.
///
/// These never propagate past the registry; they are caught, logged, and the
/// envelope is considered offered (no redelivery).
#[derive(Debug, Error)]
pub enum HandlerError {
    /// I/O failure in a file- or socket-backed sink.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Sink-specific failure (e.g., a CSV serialization error).
    #[error("sink error: {0}")]
    Sink(#[from] Box<dyn std::error::Error + Send + Sync>),

    /// Free-form failure description.
    #[error("{0}")]
    Message(String),
}

/// A conditional consumer of dispatched envelopes.
pub trait Handler: Send + Sync {
    /// Stable label used in log output.
    fn name(&self) -> &str {
        "handler"
    }

    /// Whether this handler accepts the given payload.
    ///
    /// Must behave as a pure predicate: repeated calls for the same payload
    /// must not affect correctness. A panic here is treated by the registry
    /// as "cannot handle"; the handler stays registered.
    fn can_handle(&self, payload: &dyn Payload) -> bool;

    /// Process one envelope.
    ///
    /// Called at most once per envelope, only when [`Handler::can_handle`]
    /// returned `true`, always on the owning collector's drain thread.
    fn handle(&self, envelope: &Envelope) -> Result<(), HandlerError>;

    /// Release held resources.
    ///
    /// Invoked exactly once, on the drain thread, after the last `handle`
    /// call this handler will receive.
    fn close(&self) -> Result<(), HandlerError> {
        Ok(())
    }
}

/// Shared handle to a registered handler.
///
/// Registration and removal are by pointer identity: keep a clone of the
/// `Arc` you registered if you intend to unregister it later.
pub type SharedHandler = Arc<dyn Handler>;
