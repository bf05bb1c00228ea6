//! Collector: producer-facing entry point with a dedicated drain worker.
//!
//! Single-consumer pattern: one named thread owns the dequeue side of a
//! bounded MPSC channel and is the only actor that ever invokes handlers.
//! Producers hand off payloads from arbitrary threads; a full queue blocks
//! them (back-pressure) rather than dropping or erroring.
//!
//! Lifecycle is Active → Disposed, one-way. Disposal stops intake, lets the
//! worker finish per the configured [`DrainPolicy`], closes every registered
//! handler exactly once, then joins the worker.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, SyncSender, TryRecvError, sync_channel};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use crate::config::{CollectorOptions, DrainPolicy, DrainPriority};
use crate::envelope::Envelope;
use crate::error::CollectError;
use crate::handler::SharedHandler;
use crate::registry::HandlerRegistry;

/// Prefix for drain worker thread names.
const WORKER_THREAD_PREFIX: &str = "fanout-";

// =============================================================================
// Commands
// =============================================================================

/// Commands sent to the drain worker.
enum Command {
    /// Dispatch one envelope to the handler registry.
    Dispatch(Envelope),
    /// Stop intake and shut down per the drain policy.
    Shutdown,
}

// =============================================================================
// Collector
// =============================================================================

/// A named event collector with a bounded queue and one drain worker.
///
/// Created through [`CollectorDirectory`](crate::CollectorDirectory), which
/// guarantees one instance per logical name.
pub struct Collector {
    name: String,
    thread_name: String,
    options: CollectorOptions,
    registry: Arc<HandlerRegistry>,
    tx: SyncSender<Command>,
    disposed: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for Collector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collector")
            .field("name", &self.name)
            .field("disposed", &self.is_disposed())
            .field("handlers", &self.registry.len())
            .finish_non_exhaustive()
    }
}

impl Collector {
    /// Spawn a collector and its drain worker.
    ///
    /// The worker thread is named `fanout-<name>`. Failure to start it is
    /// the one hard failure on the creation path.
    pub(crate) fn spawn(name: String, options: CollectorOptions) -> Result<Self, CollectError> {
        let (tx, rx) = sync_channel(options.get_queue_capacity());
        let registry = Arc::new(HandlerRegistry::new());
        let disposed = Arc::new(AtomicBool::new(false));
        let thread_name = format!("{WORKER_THREAD_PREFIX}{name}");

        let worker = DrainWorker {
            collector: name.clone(),
            rx,
            registry: Arc::clone(&registry),
            disposed: Arc::clone(&disposed),
            policy: options.get_drain_policy(),
            priority: options.get_priority(),
        };
        let handle = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || worker.run())
            .map_err(|e| CollectError::WorkerSpawn {
                name: name.clone(),
                source: e,
            })?;

        Ok(Self {
            name,
            thread_name,
            options,
            registry,
            tx,
            disposed,
            worker: Mutex::new(Some(handle)),
        })
    }

    /// Hand off one payload for dispatch.
    ///
    /// Wraps the payload in an [`Envelope`] stamped with the current time and
    /// the calling thread's identity, then enqueues it. Blocks the caller
    /// while the queue is full. Returns `false` without side effect once the
    /// collector is disposed, including when disposal lands while the caller
    /// is blocked waiting for space.
    pub fn hand_off<P>(&self, payload: P) -> bool
    where
        P: Any + fmt::Debug + Send + Sync,
    {
        if self.disposed.load(Ordering::Acquire) {
            return false;
        }
        let envelope = Envelope::capture(Box::new(payload));
        self.tx.send(Command::Dispatch(envelope)).is_ok()
    }

    /// Register a handler. Returns `false` once disposed.
    pub fn register_handler(&self, handler: SharedHandler) -> bool {
        if self.disposed.load(Ordering::Acquire) {
            return false;
        }
        self.registry.add(handler)
    }

    /// Unregister a previously registered handler (by pointer identity).
    ///
    /// Returns `false` when the handler is not registered or the collector
    /// is disposed; neither is an error.
    pub fn unregister_handler(&self, handler: &SharedHandler) -> bool {
        if self.disposed.load(Ordering::Acquire) {
            return false;
        }
        self.registry.remove(handler)
    }

    /// Dispose the collector.
    ///
    /// First call: stop accepting envelopes, signal the worker, let it finish
    /// per the drain policy (graceful processing or discard of the queue
    /// remainder), close every registered handler exactly once, then join the
    /// worker. Subsequent calls are no-ops.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        tracing::info!(collector = %self.name, "Disposing collector");

        // Worker already gone means the channel send fails, which is fine.
        let _ = self.tx.send(Command::Shutdown);

        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle
            && handle.join().is_err()
        {
            tracing::error!(collector = %self.name, "Drain worker panicked");
        }
    }

    /// The collector's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the drain worker thread.
    pub fn thread_name(&self) -> &str {
        &self.thread_name
    }

    /// Whether the collector has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Number of currently registered handlers.
    pub fn handler_count(&self) -> usize {
        self.registry.len()
    }

    /// Options this collector was created with.
    pub fn options(&self) -> &CollectorOptions {
        &self.options
    }
}

impl Drop for Collector {
    fn drop(&mut self) {
        self.dispose();
    }
}

// =============================================================================
// Drain worker
// =============================================================================

/// The single dedicated consumer for one collector's queue.
struct DrainWorker {
    collector: String,
    rx: Receiver<Command>,
    registry: Arc<HandlerRegistry>,
    disposed: Arc<AtomicBool>,
    policy: DrainPolicy,
    priority: DrainPriority,
}

impl DrainWorker {
    fn run(self) {
        tracing::debug!(
            collector = %self.collector,
            priority = self.priority.as_ref(),
            policy = self.policy.as_ref(),
            "Drain worker started"
        );

        loop {
            match self.rx.recv() {
                Ok(Command::Dispatch(envelope)) => {
                    // Under the immediate policy, envelopes still queued when
                    // disposal lands are discarded rather than dispatched.
                    if self.policy == DrainPolicy::Immediate
                        && self.disposed.load(Ordering::Acquire)
                    {
                        continue;
                    }
                    self.registry.process(&envelope);
                }
                Ok(Command::Shutdown) => {
                    self.drain_remainder();
                    break;
                }
                Err(_) => {
                    // All senders gone without an explicit shutdown.
                    tracing::warn!(collector = %self.collector, "Queue disconnected, shutting down");
                    break;
                }
            }
        }

        // Closing here keeps the invariant that handlers only ever run on
        // this thread, including their close() after the last handle().
        self.registry.close();
        tracing::debug!(collector = %self.collector, "Drain worker stopped");
    }

    /// Handle envelopes that raced in behind the shutdown command.
    fn drain_remainder(&self) {
        let mut discarded = 0_usize;
        loop {
            match self.rx.try_recv() {
                Ok(Command::Dispatch(envelope)) => match self.policy {
                    DrainPolicy::Graceful => self.registry.process(&envelope),
                    DrainPolicy::Immediate => discarded += 1,
                },
                Ok(Command::Shutdown) => {}
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        if discarded > 0 {
            tracing::debug!(
                collector = %self.collector,
                discarded,
                "Discarded queued envelopes on immediate shutdown"
            );
        }
    }
}
