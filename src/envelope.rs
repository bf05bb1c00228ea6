//! Event envelope and payload abstraction.
//!
//! An [`Envelope`] pairs an opaque payload with its capture timestamp and the
//! identity of the producing thread. Envelopes are created at hand-off time,
//! owned by the collector's queue until dispatch, and passed to handlers as
//! shared references only.

use std::any::Any;
use std::fmt;

use chrono::{DateTime, Utc};

/// An opaque event payload.
///
/// Blanket-implemented for every `T: Any + Debug + Send + Sync`, so any
/// ordinary value can be handed off without ceremony. Handlers use
/// [`Payload::as_any`] to test for and downcast to concrete types in
/// `can_handle`.
pub trait Payload: fmt::Debug + Send + Sync {
    /// View as [`Any`] for downcasting.
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + fmt::Debug + Send + Sync> Payload for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A timestamped, originator-tagged wrapper around a payload.
///
/// Immutable once created. Equality is irrelevant: envelopes are streamed
/// through a collector's queue, never looked up.
#[derive(Debug)]
pub struct Envelope {
    ts: DateTime<Utc>,
    originator: String,
    payload: Box<dyn Payload>,
}

impl Envelope {
    /// Capture an envelope now, tagged with the calling thread's identity.
    pub(crate) fn capture(payload: Box<dyn Payload>) -> Self {
        Self {
            ts: Utc::now(),
            originator: current_thread_label(),
            payload,
        }
    }

    /// Timestamp taken at hand-off (UTC).
    pub fn ts(&self) -> DateTime<Utc> {
        self.ts
    }

    /// Identity of the producing thread.
    pub fn originator(&self) -> &str {
        &self.originator
    }

    /// The payload, as an opaque trait object.
    pub fn payload(&self) -> &dyn Payload {
        self.payload.as_ref()
    }

    /// Downcast the payload to a concrete type.
    pub fn payload_ref<T: Any>(&self) -> Option<&T> {
        self.payload.as_ref().as_any().downcast_ref::<T>()
    }

    /// Render the payload as text.
    ///
    /// String-like payloads come through verbatim; everything else falls back
    /// to its `Debug` representation.
    pub fn payload_text(&self) -> String {
        let any = self.payload.as_ref().as_any();
        if let Some(s) = any.downcast_ref::<String>() {
            s.clone()
        } else if let Some(s) = any.downcast_ref::<&str>() {
            (*s).to_string()
        } else {
            format!("{:?}", self.payload)
        }
    }
}

/// Label for the current thread: its name, or `thread-<id>` when unnamed.
fn current_thread_label() -> String {
    let current = std::thread::current();
    match current.name() {
        Some(name) => name.to_string(),
        None => format!("thread-{:?}", current.id()),
    }
}
