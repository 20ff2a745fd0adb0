use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::record::ResultRecord;

/// Index-keyed result map shared by the submission loop and the stream listener.
///
/// Cloning yields another handle to the same map. Each upsert replaces the
/// whole record for its index; the last writer wins.
#[derive(Debug, Clone, Default)]
pub struct ResultStore {
    inner: Arc<Mutex<BTreeMap<u32, ResultRecord>>>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<u32, ResultRecord>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores `record` under its own index, returning what it replaced.
    pub fn upsert(&self, record: ResultRecord) -> Option<ResultRecord> {
        self.lock().insert(record.segment_index, record)
    }

    pub fn get(&self, index: u32) -> Option<ResultRecord> {
        self.lock().get(&index).cloned()
    }

    /// All records in ascending index order.
    pub fn snapshot(&self) -> Vec<ResultRecord> {
        self.lock().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
