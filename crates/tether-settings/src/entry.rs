#![forbid(unsafe_code)]

use std::rc::Rc;

use tether_core::Value;
use tether_runtime::{Property, Subscription};

use crate::options::SettingOptions;
use crate::tracker::EntryState;

/// One registered key: its binding, its three value generations, and the
/// subscription that keeps `current` in step with the live object.
pub(crate) struct Entry {
    pub(crate) key: String,
    pub(crate) property: Rc<dyn Property>,
    pub(crate) default: Value,
    pub(crate) previous: Value,
    pub(crate) current: Value,
    pub(crate) label: Option<String>,
    pub(crate) options: SettingOptions,
    /// `false` once a store write for this key failed, until one succeeds.
    pub(crate) persisted: bool,
    pub(crate) _subscription: Subscription,
}

impl Entry {
    pub(crate) fn state(&self) -> EntryState {
        EntryState::between(&self.previous, &self.current)
    }

    pub(crate) fn snapshot(&self) -> SettingSnapshot {
        SettingSnapshot {
            key: self.key.clone(),
            label: self.label.clone(),
            options: self.options,
            default: self.default.clone(),
            previous: self.previous.clone(),
            current: self.current.clone(),
            state: self.state(),
            persisted: self.persisted,
        }
    }
}

impl std::fmt::Debug for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry")
            .field("key", &self.key)
            .field("property", &self.property.name())
            .field("default", &self.default)
            .field("previous", &self.previous)
            .field("current", &self.current)
            .field("persisted", &self.persisted)
            .finish_non_exhaustive()
    }
}

/// Point-in-time copy of everything the registry knows about one key.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingSnapshot {
    pub key: String,
    pub label: Option<String>,
    pub options: SettingOptions,
    /// Live value before this session's first edit.
    pub default: Value,
    /// Last committed value.
    pub previous: Value,
    /// Live value.
    pub current: Value,
    pub state: EntryState,
    /// Whether the last store write for this key succeeded.
    pub persisted: bool,
}
