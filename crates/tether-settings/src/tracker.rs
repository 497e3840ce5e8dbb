#![forbid(unsafe_code)]

//! Clean/dirty classification of registered entries.
//!
//! An entry is `Dirty` iff its current value differs from its previous
//! (last committed) value, by value equality. Every entry starts `Clean`.
//!
//! ```text
//!            live edit that changes the value
//!   Clean ───────────────────────────────────▶ Dirty ──┐
//!     ▲                                          │     │ further edits
//!     └──────── apply_settings / reset_settings ─┘ ◀───┘
//! ```
//!
//! An edit that restores the committed value by hand also returns the entry
//! to `Clean`; the state is derived, never stored.

use tether_core::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryState {
    Clean,
    Dirty,
}

impl EntryState {
    #[must_use]
    pub fn between(previous: &Value, current: &Value) -> Self {
        if previous == current {
            Self::Clean
        } else {
            Self::Dirty
        }
    }

    #[must_use]
    pub const fn is_dirty(self) -> bool {
        matches!(self, Self::Dirty)
    }
}

/// Keys whose current value differs from their previous value, in the order
/// `slots` yields them.
///
/// Each item is `(key, previous, current)`.
pub fn changed_keys<'a, I>(slots: I) -> Vec<String>
where
    I: IntoIterator<Item = (&'a str, &'a Value, &'a Value)>,
{
    slots
        .into_iter()
        .filter(|(_, previous, current)| EntryState::between(previous, current).is_dirty())
        .map(|(key, _, _)| key.to_owned())
        .collect()
}
