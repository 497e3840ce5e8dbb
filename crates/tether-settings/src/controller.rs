#![forbid(unsafe_code)]

//! Batch commit and revert over every registered entry.
//!
//! Each operation is one uninterrupted pass in registration order. Store
//! failures do not stop the pass: they are collected into a
//! [`PersistenceReport`] returned once every entry was visited and the store
//! was synced. An [`InvariantViolation`](crate::SettingsError::InvariantViolation)
//! stops the pass at the offending key; entries before it keep their new
//! state, the store is still synced, and the failures seen so far travel on
//! the error.
//!
//! Slots are updated under a short state borrow; the store is only called
//! once that borrow is released.

use std::rc::Rc;

use tether_core::{Value, ValueStore};
use tether_runtime::{Property, PropertyError};

use crate::error::{PersistenceReport, Result, SettingsError};
use crate::registry::{SettingChanged, SettingsRegistry, persist_key};

/// What a per-key write into a binding came to.
enum Restore {
    /// The object took the value; this is its live value afterwards.
    Applied(Value),
    /// The object is gone.
    Detached,
}

fn restore(property: &dyn Property, value: Value) -> std::result::Result<Restore, PropertyError> {
    match property.write(value).and_then(|()| property.read()) {
        Ok(live) => Ok(Restore::Applied(live)),
        Err(error) if error.is_detached() => Ok(Restore::Detached),
        Err(error) => Err(error),
    }
}

fn sync_store(store: &dyn ValueStore, report: &mut PersistenceReport) {
    if let Err(error) = store.sync() {
        tracing::warn!(message = "settings.persist_failed", stage = "sync", error = %error);
        report.set_sync_error(error);
    }
}

impl SettingsRegistry {
    /// Commit every live edit.
    ///
    /// Dirty entries get `previous = current`. `current` is then written to
    /// the store for every entry (only dirty and unpersisted ones when
    /// `persist_unchanged_on_apply` is off) and the store is synced.
    /// Afterwards `changed_settings()` is empty, even if persistence failed,
    /// unless a store write itself edited a bound object.
    ///
    /// # Errors
    ///
    /// [`SettingsError::Persistence`] listing every key the store refused,
    /// plus the sync failure if any.
    pub fn apply_settings(&mut self) -> Result<()> {
        let mut report = PersistenceReport::new();
        let mut committed = 0_usize;

        let (store, pending) = {
            let mut state = self.state.borrow_mut();
            let persist_unchanged = state.config.persist_unchanged_on_apply;
            let mut pending = Vec::new();
            for entry in &mut state.entries {
                let dirty = entry.state().is_dirty();
                if dirty {
                    entry.previous = entry.current.clone();
                    committed += 1;
                }
                if dirty || persist_unchanged || !entry.persisted {
                    pending.push(entry.key.clone());
                }
            }
            (Rc::clone(&state.store), pending)
        };

        for key in pending {
            // Read `current` per key: an earlier write may have edited this
            // object, and the store must not be handed a stale value.
            let Ok(current) = self.current_value(&key) else {
                continue;
            };
            if let Err(error) = persist_key(&self.state, &*store, &key, current) {
                report.push(key.as_str(), error);
            }
        }
        sync_store(&*store, &mut report);
        self.replay_deferred();

        tracing::debug!(
            message = "settings.apply",
            committed,
            failed = report.len()
        );
        report.into_result()
    }

    /// Discard every live edit.
    ///
    /// Each entry's `previous` value is written back into its binding and
    /// persisted; `current` follows the binding. A binding whose object was
    /// dropped is skipped and its `current` reset to `previous`.
    ///
    /// # Errors
    ///
    /// - [`SettingsError::InvariantViolation`] if a binding rejects its own
    ///   committed value. The pass stops there; the store is synced and the
    ///   failures so far are attached.
    /// - [`SettingsError::Persistence`] for store failures, after the pass.
    pub fn reset_settings(&mut self) -> Result<()> {
        let (store, targets) = {
            let state = self.state.borrow();
            let targets: Vec<(String, Rc<dyn Property>, Value)> = state
                .entries
                .iter()
                .map(|e| (e.key.clone(), Rc::clone(&e.property), e.previous.clone()))
                .collect();
            (Rc::clone(&state.store), targets)
        };

        let mut report = PersistenceReport::new();
        let mut reverted = 0_usize;
        let mut skipped = 0_usize;
        for (key, property, previous) in targets {
            let live = match restore(&*property, previous.clone()) {
                Ok(Restore::Applied(live)) => live,
                Ok(Restore::Detached) => {
                    tracing::debug!(message = "settings.detached", key = %key);
                    skipped += 1;
                    previous.clone()
                }
                Err(error) => {
                    sync_store(&*store, &mut report);
                    self.replay_deferred();
                    tracing::debug!(
                        message = "settings.reset",
                        reverted,
                        skipped,
                        failed = report.len(),
                        aborted_at = %key
                    );
                    return Err(SettingsError::invariant(key, error).with_partial(report));
                }
            };

            {
                let mut state = self.state.borrow_mut();
                let Some(entry) = state.entry_mut(&key) else {
                    continue;
                };
                if entry.current != previous {
                    reverted += 1;
                }
                entry.current = live;
            }
            if let Err(error) = persist_key(&self.state, &*store, &key, previous) {
                report.push(key.as_str(), error);
            }
        }
        sync_store(&*store, &mut report);
        self.replay_deferred();

        tracing::debug!(
            message = "settings.reset",
            reverted,
            skipped,
            failed = report.len()
        );
        report.into_result()
    }

    /// Write every entry's `default` value back into its binding.
    ///
    /// Nothing is committed: the writes are live edits, so affected keys
    /// turn dirty until the next apply or reset. `previous` is untouched.
    ///
    /// # Errors
    ///
    /// As [`reset_settings`](Self::reset_settings), except that the store is
    /// not synced: these are live edits. Persistence failures are those of
    /// the write-through of the restored values.
    pub fn reset_default_settings(&mut self) -> Result<()> {
        let (store, targets) = {
            let state = self.state.borrow();
            let targets: Vec<(String, Rc<dyn Property>, Value)> = state
                .entries
                .iter()
                .map(|e| (e.key.clone(), Rc::clone(&e.property), e.default.clone()))
                .collect();
            (Rc::clone(&state.store), targets)
        };

        let mut report = PersistenceReport::new();
        for (key, property, default) in targets {
            let live = match restore(&*property, default) {
                Ok(Restore::Applied(live)) => live,
                Ok(Restore::Detached) => {
                    tracing::debug!(message = "settings.detached", key = %key);
                    continue;
                }
                Err(error) => {
                    self.replay_deferred();
                    return Err(SettingsError::invariant(key, error).with_partial(report));
                }
            };

            // Objects that do not notify on programmatic writes are caught up
            // here; for the rest this is a no-op.
            let outcome = self.state.borrow_mut().sync_current(&key, live);
            if let Some(value) = outcome.write_through {
                if let Err(error) = persist_key(&self.state, &*store, &key, value) {
                    report.push(key.as_str(), error);
                }
            }
            if let Some(value) = outcome.changed {
                self.changes.emit(&SettingChanged { key, value });
            }
        }
        self.replay_deferred();

        tracing::debug!(
            message = "settings.reset_default",
            dirty = self.changed_settings().len(),
            failed = report.len()
        );
        report.into_result()
    }
}
