//! Collector configuration.
//!
//! [`CollectorOptions`] carries the tunables a collector is created with:
//! queue capacity, the drain worker's scheduling priority hint, and the
//! disposal drain policy. Options apply at creation time only; looking up an
//! existing collector by name ignores them.

use strum_macros::{AsRefStr, Display, EnumString};

// =============================================================================
// Constants
// =============================================================================

/// Default bounded queue capacity.
///
/// Producers block (back-pressure) once this many envelopes are queued.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

// =============================================================================
// Enums
// =============================================================================

/// What the drain worker does with already-queued envelopes at disposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DrainPolicy {
    /// Process everything still queued before shutting down.
    #[default]
    Graceful,
    /// Discard whatever is still queued and shut down.
    Immediate,
}

/// Scheduling priority hint for the drain worker.
///
/// Recorded on the collector and logged at worker start; the standard
/// library exposes no portable thread-priority control, so the hint is
/// advisory metadata rather than an OS-level setting.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, AsRefStr, Display, EnumString,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DrainPriority {
    /// Background work, deprioritized relative to producers.
    Low,
    /// No preference.
    #[default]
    Normal,
    /// Latency-sensitive dispatch.
    High,
}

// =============================================================================
// Options
// =============================================================================

/// Options a collector is created with.
#[derive(Debug, Clone)]
pub struct CollectorOptions {
    queue_capacity: usize,
    priority: DrainPriority,
    drain_policy: DrainPolicy,
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectorOptions {
    /// Options with default capacity, normal priority, graceful drain.
    pub fn new() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            priority: DrainPriority::default(),
            drain_policy: DrainPolicy::default(),
        }
    }

    /// Set the bounded queue capacity (clamped to a minimum of 1).
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Set the drain worker priority hint.
    pub fn priority(mut self, priority: DrainPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the disposal drain policy.
    pub fn drain_policy(mut self, policy: DrainPolicy) -> Self {
        self.drain_policy = policy;
        self
    }

    /// Configured queue capacity.
    pub fn get_queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    /// Configured priority hint.
    pub fn get_priority(&self) -> DrainPriority {
        self.priority
    }

    /// Configured drain policy.
    pub fn get_drain_policy(&self) -> DrainPolicy {
        self.drain_policy
    }
}
