#![forbid(unsafe_code)]

//! The key/value store capability consumed by the settings registry.
//!
//! A [`ValueStore`] is the persistence mirror behind a registry: it maps
//! case-sensitive string keys to [`Value`]s. The registry never assumes a
//! store is authoritative while objects are bound; it only needs `get`,
//! `set` and `clear`, and reports every failure back to its caller.
//!
//! All methods take `&self`. Stores are shared between a registry and the
//! code that created it (tests inspect the store after edits), so mutation
//! happens behind interior mutability, the same way [`MemoryStore`] clones
//! share one map.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Surfaced as |
//! |---------|-------|-------------|
//! | Backend offline | Disk gone, remote unreachable | [`StoreError::Unavailable`] |
//! | Key refused | Read-only key, quota | [`StoreError::Rejected`] |
//! | I/O failure | File store write/rename | [`StoreError::Io`] |

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::value::Value;

/// Errors raised by a [`ValueStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("store rejected key '{key}': {reason}")]
    Rejected { key: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "file-store")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn rejected(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Persistent key/value capability.
pub trait ValueStore {
    /// Read the value stored under `key`, or `None` when absent.
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Remove every key.
    fn clear(&self) -> Result<(), StoreError>;

    /// All stored keys, in the store's own order.
    fn keys(&self) -> Result<Vec<String>, StoreError>;

    fn contains(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }

    /// Flush buffered writes to the backing medium.
    fn sync(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

impl<S: ValueStore + ?Sized> ValueStore for Rc<S> {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }

    fn clear(&self) -> Result<(), StoreError> {
        (**self).clear()
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        (**self).keys()
    }

    fn contains(&self, key: &str) -> Result<bool, StoreError> {
        (**self).contains(key)
    }

    fn sync(&self) -> Result<(), StoreError> {
        (**self).sync()
    }
}

/// In-memory store. Clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<BTreeMap<String, Value>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Infallible read, for callers that know this is a `MemoryStore`.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<Value> {
        self.entries.borrow().get(key).cloned()
    }

    /// Copy of the whole map.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.entries.borrow().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl FromIterator<(String, Value)> for MemoryStore {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            entries: Rc::new(RefCell::new(iter.into_iter().collect())),
        }
    }
}

impl ValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.value(key))
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.entries.borrow_mut().insert(key.to_owned(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.entries.borrow_mut().clear();
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entries.borrow().keys().cloned().collect())
    }
}
