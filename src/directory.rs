//! Collector directory: name-keyed collector creation and lookup.
//!
//! The directory guarantees one [`Collector`] per logical name: concurrent
//! callers asking for the same name either observe the same existing
//! instance or trigger exactly one creation. There is no removal; collectors
//! live as long as the directory that created them.
//!
//! Tests and embedded uses construct their own directory; code that wants
//! the classic process-wide map uses [`CollectorDirectory::global`].

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
use std::sync::Arc;

use crate::collector::Collector;
use crate::config::CollectorOptions;
use crate::error::CollectError;

/// Process-wide directory instance.
static GLOBAL: OnceLock<CollectorDirectory> = OnceLock::new();

/// Name-keyed factory and registry of collectors.
#[derive(Default)]
pub struct CollectorDirectory {
    collectors: Mutex<HashMap<String, Arc<Collector>>>,
}

impl std::fmt::Debug for CollectorDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectorDirectory")
            .field("collectors", &self.len())
            .finish_non_exhaustive()
    }
}

impl CollectorDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide directory.
    pub fn global() -> &'static CollectorDirectory {
        GLOBAL.get_or_init(CollectorDirectory::new)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<Collector>>> {
        self.collectors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Get the collector for `name`, creating it with default options.
    pub fn get(&self, name: &str) -> Result<Arc<Collector>, CollectError> {
        self.get_with(name, CollectorOptions::default())
    }

    /// Get the collector for `name`, creating it with `options`.
    ///
    /// Options take effect only when this call performs the first creation;
    /// an existing collector is returned as-is. The creation lock is held
    /// across the spawn, so racing callers for one name see one instance.
    pub fn get_with(
        &self,
        name: &str,
        options: CollectorOptions,
    ) -> Result<Arc<Collector>, CollectError> {
        let mut collectors = self.lock();
        if let Some(collector) = collectors.get(name) {
            return Ok(Arc::clone(collector));
        }

        let collector = Arc::new(Collector::spawn(name.to_string(), options)?);
        collectors.insert(name.to_string(), Arc::clone(&collector));
        tracing::info!(collector = %name, "Collector created");
        Ok(collector)
    }

    /// Number of collectors created so far.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no collector has been created yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of all collectors created so far, unordered.
    pub fn names(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }
}
