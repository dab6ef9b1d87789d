//! Cloneable, lock-guarded handle to one report store.
//!
//! Store calls never interleave: each one runs to completion under the lock.
//! Long-running collaborators must release the handle before awaiting.

use crate::store::report_store::ReportStore;
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

#[derive(Clone)]
pub struct SharedReportStore {
    inner: Arc<Mutex<ReportStore>>,
}

impl SharedReportStore {
    pub fn new(store: ReportStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Locks the store for a sequence of calls.
    pub fn lock(&self) -> MutexGuard<'_, ReportStore> {
        self.inner.lock()
    }

    /// Runs `f` with shared access.
    pub fn read<T>(&self, f: impl FnOnce(&ReportStore) -> T) -> T {
        f(&self.inner.lock())
    }

    /// Runs `f` with exclusive access.
    pub fn write<T>(&self, f: impl FnOnce(&mut ReportStore) -> T) -> T {
        f(&mut self.inner.lock())
    }
}
