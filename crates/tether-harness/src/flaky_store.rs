#![forbid(unsafe_code)]

//! A store whose failures are scripted by the test.

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::rc::Rc;

use tether_core::{MemoryStore, StoreError, Value, ValueStore};

#[derive(Debug, Default)]
struct Faults {
    all: Cell<bool>,
    reads: Cell<bool>,
    sync: Cell<bool>,
    keys: RefCell<BTreeSet<String>>,
}

/// [`MemoryStore`] wrapper that can refuse reads, writes or sync.
///
/// Clones share both the data and the fault switches, so a test can keep
/// one handle while the registry owns another.
#[derive(Debug, Clone, Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    faults: Rc<Faults>,
    writes: Rc<Cell<usize>>,
    syncs: Rc<Cell<usize>>,
}

impl FlakyStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap existing data.
    #[must_use]
    pub fn over(inner: MemoryStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    /// Refuse every write and removal.
    pub fn fail_all_writes(&self, fail: bool) {
        self.faults.all.set(fail);
    }

    /// Refuse writes to `key` only.
    pub fn fail_key(&self, key: impl Into<String>) {
        self.faults.keys.borrow_mut().insert(key.into());
    }

    pub fn heal_key(&self, key: &str) {
        self.faults.keys.borrow_mut().remove(key);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.faults.reads.set(fail);
    }

    pub fn fail_sync(&self, fail: bool) {
        self.faults.sync.set(fail);
    }

    /// Clear every fault.
    pub fn heal(&self) {
        self.faults.all.set(false);
        self.faults.reads.set(false);
        self.faults.sync.set(false);
        self.faults.keys.borrow_mut().clear();
    }

    /// Successful writes so far.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    /// Successful syncs so far.
    #[must_use]
    pub fn syncs(&self) -> usize {
        self.syncs.get()
    }

    /// The underlying data, bypassing every fault.
    #[must_use]
    pub fn memory(&self) -> &MemoryStore {
        &self.inner
    }

    fn check_write(&self, key: &str) -> Result<(), StoreError> {
        if self.faults.all.get() {
            tracing::trace!(message = "store.fault_injected", op = "write", key);
            return Err(StoreError::unavailable("store offline"));
        }
        if self.faults.keys.borrow().contains(key) {
            tracing::trace!(message = "store.fault_injected", op = "write", key);
            return Err(StoreError::rejected(key, "key is read-only"));
        }
        Ok(())
    }
}

impl ValueStore for FlakyStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        if self.faults.reads.get() {
            tracing::trace!(message = "store.fault_injected", op = "read", key);
            return Err(StoreError::unavailable("reads disabled"));
        }
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.check_write(key)?;
        self.inner.set(key, value)?;
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.check_write(key)?;
        self.inner.remove(key)
    }

    fn clear(&self) -> Result<(), StoreError> {
        if self.faults.all.get() {
            return Err(StoreError::unavailable("store offline"));
        }
        self.inner.clear()
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        self.inner.keys()
    }

    fn sync(&self) -> Result<(), StoreError> {
        if self.faults.sync.get() {
            tracing::trace!(message = "store.fault_injected", op = "sync");
            return Err(StoreError::unavailable("sync disabled"));
        }
        self.syncs.set(self.syncs.get() + 1);
        Ok(())
    }
}
