use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::MetricsError;

use super::recorder::InMemoryRecorder;

/// Registry of per-run metric namespaces.
///
/// Hands out one fresh recorder per run id and refuses ids that are still
/// held, so concurrent runs never share counters.
#[derive(Debug, Default)]
pub struct MetricsHub {
    namespaces: Mutex<BTreeMap<String, Arc<InMemoryRecorder>>>,
}

impl MetricsHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a new, unregistered recorder for `run_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the run id is empty or already reserved.
    pub fn reserve(&self, run_id: &str) -> Result<Arc<InMemoryRecorder>, MetricsError> {
        if run_id.trim().is_empty() {
            return Err(MetricsError::EmptyRunId);
        }
        let mut namespaces = self
            .namespaces
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if namespaces.contains_key(run_id) {
            return Err(MetricsError::NamespaceInUse {
                run_id: run_id.to_owned(),
            });
        }
        let recorder = Arc::new(InMemoryRecorder::new());
        namespaces.insert(run_id.to_owned(), Arc::clone(&recorder));
        Ok(recorder)
    }

    #[must_use]
    pub fn get(&self, run_id: &str) -> Option<Arc<InMemoryRecorder>> {
        self.namespaces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(run_id)
            .cloned()
    }

    /// Remove a namespace, freeing its run id for reuse.
    pub fn release(&self, run_id: &str) -> Option<Arc<InMemoryRecorder>> {
        self.namespaces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(run_id)
    }

    #[must_use]
    pub fn run_ids(&self) -> Vec<String> {
        self.namespaces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}
