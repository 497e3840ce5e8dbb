#![forbid(unsafe_code)]

//! JSON file backed [`ValueStore`].
//!
//! The whole map lives in memory and is written out as one pretty-printed
//! JSON object. Writes go to a sibling `*.tmp` file first and are then
//! renamed over the target, so a crash mid-write leaves the previous file
//! intact.
//!
//! With auto-sync on (the default), every mutation rewrites the file and a
//! failed write is returned from that mutation. With auto-sync off, callers
//! batch mutations and call [`ValueStore::sync`] themselves.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::store::{StoreError, ValueStore};
use crate::value::Value;

/// Store persisting to a single JSON file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: RefCell<BTreeMap<String, Value>>,
    auto_sync: bool,
    dirty: Cell<bool>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file is an empty store; the file is
    /// created on the first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            if contents.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&contents)?
            }
        } else {
            BTreeMap::new()
        };
        tracing::debug!(
            message = "store.open",
            path = %path.display(),
            keys = entries.len()
        );
        Ok(Self {
            path,
            entries: RefCell::new(entries),
            auto_sync: true,
            dirty: Cell::new(false),
        })
    }

    /// Disable or enable writing the file on every mutation.
    #[must_use]
    pub fn with_auto_sync(mut self, auto_sync: bool) -> Self {
        self.auto_sync = auto_sync;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether there are mutations not yet written to disk.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.as_os_str().to_owned();
        temp.push(".tmp");
        PathBuf::from(temp)
    }

    fn write_file(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&*self.entries.borrow())?;
        let temp = self.temp_path();
        fs::write(&temp, json)?;
        fs::rename(&temp, &self.path)?;
        self.dirty.set(false);
        Ok(())
    }

    fn mutated(&self) -> Result<(), StoreError> {
        self.dirty.set(true);
        if self.auto_sync {
            self.write_file()
        } else {
            Ok(())
        }
    }
}

impl ValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.entries.borrow_mut().insert(key.to_owned(), value);
        self.mutated()
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let removed = self.entries.borrow_mut().remove(key).is_some();
        if removed { self.mutated() } else { Ok(()) }
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.entries.borrow_mut().clear();
        self.mutated()
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entries.borrow().keys().cloned().collect())
    }

    fn sync(&self) -> Result<(), StoreError> {
        if self.dirty.get() {
            self.write_file()
        } else {
            Ok(())
        }
    }
}
