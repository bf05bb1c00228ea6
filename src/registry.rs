//! Handler registry: ordered fan-out with per-handler fault isolation.
//!
//! The registry is the failure-containment boundary of the subsystem. Every
//! handler invocation (`can_handle`, `handle`, `close`) is individually
//! wrapped: an `Err` return or a panic is logged and swallowed, so one
//! misbehaving handler never blocks later handlers or the drain worker.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::envelope::Envelope;
use crate::handler::SharedHandler;

struct Inner {
    handlers: Vec<SharedHandler>,
    closed: bool,
}

/// Ordered, concurrently mutable collection of handlers.
///
/// Insertion order is dispatch order. Registration and removal may race with
/// dispatch from the drain thread; dispatch works from a snapshot, so it
/// never observes a partially mutated collection (a handler added or removed
/// mid-dispatch may simply miss that one envelope).
pub struct HandlerRegistry {
    inner: Mutex<Inner>,
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.len())
            .finish_non_exhaustive()
    }
}

impl HandlerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                handlers: Vec::new(),
                closed: false,
            }),
        }
    }

    // The lock is never held across handler invocations, so poisoning cannot
    // originate here; recover rather than propagate if it ever happens.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a handler. Returns `false` (without adding) once closed.
    ///
    /// Duplicates are permitted; each registered instance receives its own
    /// dispatch and close calls.
    pub fn add(&self, handler: SharedHandler) -> bool {
        let mut inner = self.lock();
        if inner.closed {
            return false;
        }
        inner.handlers.push(handler);
        true
    }

    /// Remove the first pointer-identical registration of `handler`.
    ///
    /// Returns `false` when no matching instance is registered or the
    /// registry is closed; neither case is an error.
    pub fn remove(&self, handler: &SharedHandler) -> bool {
        let mut inner = self.lock();
        if inner.closed {
            return false;
        }
        match inner
            .handlers
            .iter()
            .position(|h| std::sync::Arc::ptr_eq(h, handler))
        {
            Some(index) => {
                inner.handlers.remove(index);
                true
            }
            None => false,
        }
    }

    /// Number of currently registered handlers.
    pub fn len(&self) -> usize {
        self.lock().handlers.len()
    }

    /// Whether no handlers are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the registry has been closed.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Dispatch one envelope to every accepting handler, in registration
    /// order.
    ///
    /// Each handler's predicate/handle pair is fully isolated: a fault in one
    /// handler is logged and does not affect subsequently registered
    /// handlers, nor does it escape to the caller.
    pub fn process(&self, envelope: &Envelope) {
        let snapshot = {
            let inner = self.lock();
            if inner.closed {
                return;
            }
            inner.handlers.clone()
        };

        for handler in &snapshot {
            let accepted =
                match catch_unwind(AssertUnwindSafe(|| handler.can_handle(envelope.payload()))) {
                    Ok(accepted) => accepted,
                    Err(_) => {
                        tracing::warn!(
                            handler = handler.name(),
                            "can_handle panicked, treating as not handled"
                        );
                        false
                    }
                };
            if !accepted {
                continue;
            }

            match catch_unwind(AssertUnwindSafe(|| handler.handle(envelope))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(handler = handler.name(), error = %e, "Handler failed");
                }
                Err(_) => {
                    tracing::warn!(handler = handler.name(), "Handler panicked");
                }
            }
        }
    }

    /// Close every registered handler, in registration order, then refuse
    /// further registrations.
    ///
    /// Each handler is closed at most once; faults during close are logged
    /// and do not prevent closing the rest. Subsequent calls are no-ops.
    pub fn close(&self) {
        let handlers = {
            let mut inner = self.lock();
            if inner.closed {
                return;
            }
            inner.closed = true;
            std::mem::take(&mut inner.handlers)
        };

        for handler in &handlers {
            match catch_unwind(AssertUnwindSafe(|| handler.close())) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(handler = handler.name(), error = %e, "Handler close failed");
                }
                Err(_) => {
                    tracing::warn!(handler = handler.name(), "Handler panicked during close");
                }
            }
        }
    }
}
