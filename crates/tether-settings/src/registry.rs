#![forbid(unsafe_code)]

//! The settings registry: keys bound to live properties, mirrored to a store.
//!
//! Each registered key carries three generations of its value:
//!
//! | Slot | Set by | Meaning |
//! |------|--------|---------|
//! | `default` | registration only | what the binding held before this session's first edit |
//! | `previous` | apply, reset, store rebind | last committed value |
//! | `current` | every live notification | the live value |
//!
//! The live object is the source of truth. The registry subscribes to each
//! binding's change notification, re-reads the property, updates `current`,
//! and (with `write_through`) writes it to the store at once, so external
//! readers of the store see interim edits and not just committed ones. The
//! store and the committed snapshot can therefore diverge until
//! [`apply_settings`](SettingsRegistry::apply_settings) runs.
//!
//! # Invariants
//!
//! 1. `default` is assigned once per registration and never changes.
//! 2. Right after registration `default == previous == current`.
//! 3. `changed_settings()` lists dirty keys in registration order.
//! 4. No registry borrow is held while a property is read or written or
//!    while the store is called, so a write that fans out to other bound
//!    keys re-enters cleanly.
//! 5. A notification that still finds the state borrowed is queued and
//!    replayed once the borrow is released; `current` always catches up
//!    with the live value.
//!
//! # Failure Modes
//!
//! | Failure | Effect |
//! |---------|--------|
//! | Store read/write fails at registration | entry registered from the live value, `Persistence` returned |
//! | Store write fails on a live edit | `current` updated, key listed in `unpersisted_settings()`, warning logged |
//! | Binding unreadable or rejects stored value | `InvariantViolation`, nothing registered |
//! | Bound object dropped | notifications stop; reset skips the key |
//! | Notification while the state is borrowed | key queued, mirrored on the next replay |

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use ahash::AHashMap;
use tether_core::{MemoryStore, StoreError, Value, ValueStore};
use tether_runtime::{Property, Signal, Subscription};

use crate::config::RegistryConfig;
use crate::entry::{Entry, SettingSnapshot};
use crate::error::{PersistenceReport, Result, SettingsError};
use crate::options::{Registration, SettingOptions};
use crate::tracker::{self, EntryState};

/// Emitted after a live edit has been mirrored into the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingChanged {
    pub key: String,
    pub value: Value,
}

/// Outcome of folding one live read into an entry.
#[derive(Debug, Default)]
pub(crate) struct LiveSync {
    pub(crate) changed: Option<Value>,
    /// Value to mirror to the store once the state borrow is released.
    pub(crate) write_through: Option<Value>,
}

/// Keys whose notification arrived while the registry state was borrowed.
pub(crate) type Deferred = Rc<RefCell<Vec<String>>>;

pub(crate) struct RegistryState {
    pub(crate) store: Rc<dyn ValueStore>,
    pub(crate) config: RegistryConfig,
    pub(crate) entries: Vec<Entry>,
    index: AHashMap<String, usize>,
}

impl RegistryState {
    fn new(store: Rc<dyn ValueStore>, config: RegistryConfig) -> Self {
        Self {
            store,
            config,
            entries: Vec::new(),
            index: AHashMap::new(),
        }
    }

    pub(crate) fn entry(&self, key: &str) -> Result<&Entry> {
        self.index
            .get(key)
            .map(|&i| &self.entries[i])
            .ok_or_else(|| SettingsError::not_found(key))
    }

    pub(crate) fn entry_mut(&mut self, key: &str) -> Option<&mut Entry> {
        let i = *self.index.get(key)?;
        self.entries.get_mut(i)
    }

    /// Insert `entry`, replacing any entry under the same key in place.
    /// The replaced entry is handed back so it is dropped after the borrow.
    fn insert(&mut self, entry: Entry) -> Option<Entry> {
        match self.index.get(&entry.key) {
            Some(&i) => Some(std::mem::replace(&mut self.entries[i], entry)),
            None => {
                self.index.insert(entry.key.clone(), self.entries.len());
                self.entries.push(entry);
                None
            }
        }
    }

    /// Fold a freshly read live value into `key`'s `current` slot.
    ///
    /// A value equal to `current` is a no-op unless the last store write for
    /// the key failed, in which case the write is retried. The store itself
    /// is not called here; see [`persist_key`].
    pub(crate) fn sync_current(&mut self, key: &str, live: Value) -> LiveSync {
        let write_through = self.config.write_through;
        let Some(entry) = self.entry_mut(key) else {
            return LiveSync::default();
        };

        let changed = entry.current != live;
        if !changed && (entry.persisted || !write_through) {
            return LiveSync::default();
        }
        if changed {
            entry.current = live.clone();
            tracing::debug!(
                message = "settings.changed",
                key,
                dirty = entry.state().is_dirty()
            );
        }
        LiveSync {
            write_through: write_through.then(|| live.clone()),
            changed: changed.then_some(live),
        }
    }
}

/// Write `value` to `store` under `key` with no state borrow held, then
/// record the outcome on the entry.
pub(crate) fn persist_key(
    state: &RefCell<RegistryState>,
    store: &dyn ValueStore,
    key: &str,
    value: Value,
) -> std::result::Result<(), StoreError> {
    let outcome = store.set(key, value);
    if let Some(entry) = state.borrow_mut().entry_mut(key) {
        entry.persisted = outcome.is_ok();
    }
    if let Err(error) = &outcome {
        tracing::warn!(message = "settings.persist_failed", key, error = %error);
    }
    outcome
}

/// Maps settings keys to live property bindings and their value slots.
///
/// ```ignore
/// let store = MemoryStore::new();
/// let mut registry = SettingsRegistry::new(store.clone());
///
/// let checked = Observable::new(false);
/// registry.register_property("key 1", PropertyBinding::new("checked", &checked))?;
///
/// checked.set(true);
/// assert_eq!(registry.changed_settings(), vec!["key 1"]);
/// assert_eq!(store.value("key 1"), Some(Value::Bool(true)));
///
/// registry.apply_settings()?;
/// assert!(registry.changed_settings().is_empty());
/// ```
pub struct SettingsRegistry {
    pub(crate) state: Rc<RefCell<RegistryState>>,
    pub(crate) changes: Signal<SettingChanged>,
    deferred: Deferred,
}

impl Default for SettingsRegistry {
    fn default() -> Self {
        Self::new(MemoryStore::new())
    }
}

impl std::fmt::Debug for SettingsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("SettingsRegistry")
            .field("config", &state.config)
            .field("entries", &state.entries)
            .finish_non_exhaustive()
    }
}

impl SettingsRegistry {
    /// Registry over `store` with the default [`RegistryConfig`].
    ///
    /// Pass an `Rc<S>` to keep a handle to a store that is not `Clone`.
    pub fn new(store: impl ValueStore + 'static) -> Self {
        Self::with_config(store, RegistryConfig::default())
    }

    pub fn with_config(store: impl ValueStore + 'static, config: RegistryConfig) -> Self {
        Self {
            state: Rc::new(RefCell::new(RegistryState::new(Rc::new(store), config))),
            changes: Signal::new(),
            deferred: Deferred::default(),
        }
    }

    #[must_use]
    pub fn config(&self) -> RegistryConfig {
        self.state.borrow().config
    }

    /// Shared handle to the store currently in use.
    #[must_use]
    pub fn store(&self) -> Rc<dyn ValueStore> {
        Rc::clone(&self.state.borrow().store)
    }

    /// Bind `key` to `property`. See [`register_property_with`](Self::register_property_with).
    pub fn register_property(
        &mut self,
        key: impl Into<String>,
        property: impl Property + 'static,
    ) -> Result<()> {
        self.register_property_with(key, property, Registration::default())
    }

    /// Bind `key` to `property` with a label and option flags.
    ///
    /// If the store holds a value for `key`, it is written into the property
    /// and becomes all three slots. Otherwise the live value does, and is
    /// seeded into the store (unless `seed_store` is off).
    ///
    /// Registering an existing key replaces its entry in place: same
    /// position in `changed_settings()`, fresh slots, old binding released.
    ///
    /// # Errors
    ///
    /// - [`SettingsError::EmptyKey`] for `""`.
    /// - [`SettingsError::InvariantViolation`] if the property cannot be
    ///   read, rejects the stored value, or cannot be subscribed to. Nothing
    ///   is registered.
    /// - [`SettingsError::Persistence`] if the store read or seed failed.
    ///   The entry *is* registered, from the live value.
    pub fn register_property_with(
        &mut self,
        key: impl Into<String>,
        property: impl Property + 'static,
        registration: Registration,
    ) -> Result<()> {
        let key = key.into();
        if key.is_empty() {
            return Err(SettingsError::EmptyKey);
        }
        let property: Rc<dyn Property> = Rc::new(property);
        let invariant = |e| SettingsError::invariant(key.as_str(), e);

        let live = property.read().map_err(invariant)?;
        let (store, config) = {
            let state = self.state.borrow();
            (Rc::clone(&state.store), state.config)
        };

        let mut report = PersistenceReport::new();
        let (value, origin) = match store.get(&key) {
            Ok(Some(stored)) => {
                if stored != live {
                    property.write(stored).map_err(invariant)?;
                }
                (property.read().map_err(invariant)?, "store")
            }
            Ok(None) => {
                if config.seed_store {
                    if let Err(error) = store.set(&key, live.clone()) {
                        tracing::warn!(message = "settings.persist_failed", key = %key, error = %error);
                        report.push(key.as_str(), error);
                    }
                }
                (live, "live")
            }
            Err(error) => {
                tracing::warn!(message = "settings.persist_failed", key = %key, error = %error);
                report.push(key.as_str(), error);
                (live, "live")
            }
        };

        let subscription = property
            .subscribe(self.notification_handler(&key))
            .map_err(invariant)?;

        let entry = Entry {
            key: key.clone(),
            property,
            default: value.clone(),
            previous: value.clone(),
            current: value,
            label: registration.label,
            options: registration.options,
            persisted: report.is_empty(),
            _subscription: subscription,
        };
        let old = self.state.borrow_mut().insert(entry);
        let replaced = old.is_some();
        drop(old);
        self.replay_deferred();

        if replaced {
            tracing::debug!(message = "settings.replace", key = %key, origin);
        } else {
            tracing::debug!(message = "settings.register", key = %key, origin);
        }
        report.into_result()
    }

    fn notification_handler(&self, key: &str) -> Rc<dyn Fn()> {
        let state = Rc::downgrade(&self.state);
        let changes = self.changes.clone();
        let deferred = Rc::clone(&self.deferred);
        let key = key.to_owned();
        Rc::new(move || {
            on_live_edit(&state, &deferred, &changes, &key);
            replay(&state, &deferred, &changes);
        })
    }

    /// Mirror every notification that was queued behind a state borrow.
    pub(crate) fn replay_deferred(&self) {
        replay(&Rc::downgrade(&self.state), &self.deferred, &self.changes);
    }

    /// Dirty keys, in registration order.
    #[must_use]
    pub fn changed_settings(&self) -> Vec<String> {
        let state = self.state.borrow();
        tracker::changed_keys(
            state
                .entries
                .iter()
                .map(|e| (e.key.as_str(), &e.previous, &e.current)),
        )
    }

    /// Dirty keys registered with [`SettingOptions::REQUIRE_RESTART`].
    #[must_use]
    pub fn changed_settings_requiring_restart(&self) -> Vec<String> {
        let state = self.state.borrow();
        tracker::changed_keys(
            state
                .entries
                .iter()
                .filter(|e| e.options.contains(SettingOptions::REQUIRE_RESTART))
                .map(|e| (e.key.as_str(), &e.previous, &e.current)),
        )
    }

    /// Keys whose last store write failed.
    #[must_use]
    pub fn unpersisted_settings(&self) -> Vec<String> {
        self.state
            .borrow()
            .entries
            .iter()
            .filter(|e| !e.persisted)
            .map(|e| e.key.clone())
            .collect()
    }

    pub fn default_value(&self, key: &str) -> Result<Value> {
        Ok(self.state.borrow().entry(key)?.default.clone())
    }

    pub fn previous_value(&self, key: &str) -> Result<Value> {
        Ok(self.state.borrow().entry(key)?.previous.clone())
    }

    pub fn current_value(&self, key: &str) -> Result<Value> {
        Ok(self.state.borrow().entry(key)?.current.clone())
    }

    pub fn setting_label(&self, key: &str) -> Result<Option<String>> {
        Ok(self.state.borrow().entry(key)?.label.clone())
    }

    pub fn setting_options(&self, key: &str) -> Result<SettingOptions> {
        Ok(self.state.borrow().entry(key)?.options)
    }

    pub fn entry_state(&self, key: &str) -> Result<EntryState> {
        Ok(self.state.borrow().entry(key)?.state())
    }

    pub fn snapshot(&self, key: &str) -> Result<SettingSnapshot> {
        Ok(self.state.borrow().entry(key)?.snapshot())
    }

    /// Snapshots of every entry, in registration order.
    #[must_use]
    pub fn snapshots(&self) -> Vec<SettingSnapshot> {
        self.state.borrow().entries.iter().map(Entry::snapshot).collect()
    }

    /// Registered keys, in registration order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.state
            .borrow()
            .entries
            .iter()
            .map(|e| e.key.clone())
            .collect()
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.state.borrow().index.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.borrow().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Call `callback` after each live edit is mirrored into the registry.
    pub fn on_setting_changed(
        &self,
        callback: impl Fn(&SettingChanged) + 'static,
    ) -> Subscription {
        self.changes.subscribe(callback)
    }

    /// Switch to `store` and re-run load-or-seed for every entry.
    ///
    /// A stored value is written into the binding and becomes the committed
    /// baseline (`previous == current`). An absent key is seeded from the
    /// live value, which likewise becomes the baseline. `default` is never
    /// touched.
    ///
    /// # Errors
    ///
    /// `InvariantViolation` aborts the pass at the offending key. Store
    /// failures are collected and returned as `Persistence` after the pass.
    pub fn set_store(&mut self, store: impl ValueStore + 'static) -> Result<()> {
        let store: Rc<dyn ValueStore> = Rc::new(store);
        let (targets, seed_store) = {
            let mut state = self.state.borrow_mut();
            state.store = Rc::clone(&store);
            let targets: Vec<(String, Rc<dyn Property>)> = state
                .entries
                .iter()
                .map(|e| (e.key.clone(), Rc::clone(&e.property)))
                .collect();
            (targets, state.config.seed_store)
        };

        let mut report = PersistenceReport::new();
        let mut loaded = 0_usize;
        for (key, property) in targets {
            match store.get(&key) {
                Ok(Some(stored)) => {
                    let live = match property.write(stored.clone()).and_then(|()| property.read()) {
                        Ok(live) => live,
                        Err(error) if error.is_detached() => {
                            tracing::debug!(message = "settings.detached", key = %key);
                            stored
                        }
                        Err(error) => {
                            self.replay_deferred();
                            return Err(SettingsError::invariant(key, error).with_partial(report));
                        }
                    };
                    let mut state = self.state.borrow_mut();
                    if let Some(entry) = state.entry_mut(&key) {
                        entry.previous = live.clone();
                        entry.current = live;
                        entry.persisted = true;
                    }
                    loaded += 1;
                }
                Ok(None) => {
                    let current = self.state.borrow_mut().entry_mut(&key).map(|entry| {
                        entry.previous = entry.current.clone();
                        entry.current.clone()
                    });
                    if let (Some(current), true) = (current, seed_store) {
                        if let Err(error) = persist_key(&self.state, &*store, &key, current) {
                            report.push(key.as_str(), error);
                        }
                    }
                }
                Err(error) => {
                    tracing::warn!(message = "settings.persist_failed", key = %key, error = %error);
                    if let Some(entry) = self.state.borrow_mut().entry_mut(&key) {
                        entry.persisted = false;
                    }
                    report.push(key.as_str(), error);
                }
            }
        }

        self.replay_deferred();
        tracing::debug!(
            message = "settings.rebind_store",
            entries = self.len(),
            loaded,
            failed = report.len()
        );
        report.into_result()
    }
}

/// Notification path: re-read the property behind `key` and mirror it.
///
/// If the state is borrowed further up the stack, `key` is queued on
/// `deferred` and picked up by the next [`replay`].
fn on_live_edit(
    state: &Weak<RefCell<RegistryState>>,
    deferred: &Deferred,
    changes: &Signal<SettingChanged>,
    key: &str,
) {
    let Some(state) = state.upgrade() else {
        return;
    };
    let defer = || {
        tracing::trace!(message = "settings.notification_deferred", key);
        let mut queue = deferred.borrow_mut();
        if !queue.iter().any(|k| k == key) {
            queue.push(key.to_owned());
        }
    };

    let (property, store) = match state.try_borrow() {
        Ok(state) => match state.entry(key) {
            Ok(entry) => (Rc::clone(&entry.property), Rc::clone(&state.store)),
            Err(_) => return,
        },
        Err(_) => return defer(),
    };

    let live = match property.read() {
        Ok(live) => live,
        Err(error) => {
            tracing::warn!(message = "settings.property_failed", key, error = %error);
            return;
        }
    };

    let outcome = match state.try_borrow_mut() {
        Ok(mut state) => state.sync_current(key, live),
        Err(_) => return defer(),
    };
    if let Some(value) = outcome.write_through {
        // Failures are tracked on the entry and logged by `persist_key`.
        let _ = persist_key(&state, &*store, key, value);
    }
    if let Some(value) = outcome.changed {
        changes.emit(&SettingChanged {
            key: key.to_owned(),
            value,
        });
    }
}

/// One pass over the queued keys. Keys that are deferred again stay queued.
fn replay(state: &Weak<RefCell<RegistryState>>, deferred: &Deferred, changes: &Signal<SettingChanged>) {
    let keys = std::mem::take(&mut *deferred.borrow_mut());
    for key in keys {
        on_live_edit(state, deferred, changes, &key);
    }
}
