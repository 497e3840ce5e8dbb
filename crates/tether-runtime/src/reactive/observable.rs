#![forbid(unsafe_code)]

//! Shared, version-tracked values with change notification.
//!
//! [`Observable<T>`] is the live state of a bound object's property: a
//! check box's `checked` flag, a line edit's `text`. Handles are cheap to
//! clone and share one value. A [`WeakObservable<T>`] is the non-owning
//! handle a binding keeps, so a registry never extends the lifetime of the
//! objects it watches.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per mutation that changes the value.
//! 2. Setting a value equal to the current value is a no-op (no version
//!    bump, no notification).
//! 3. Subscribers run after the new value is visible through `get()`.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use super::signal::{Signal, Subscription};

struct ObservableInner<T> {
    value: RefCell<T>,
    version: Cell<u64>,
    changed: Signal<T>,
}

/// Shared mutable value with change notification.
pub struct Observable<T> {
    inner: Rc<ObservableInner<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observable")
            .field("value", &*self.inner.value.borrow())
            .field("version", &self.inner.version.get())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(ObservableInner {
                value: RefCell::new(value),
                version: Cell::new(0),
                changed: Signal::new(),
            }),
        }
    }

    /// Clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Borrow the current value without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Replace the value, notifying subscribers if it changed.
    pub fn set(&self, value: T) {
        {
            let mut slot = self.inner.value.borrow_mut();
            if *slot == value {
                return;
            }
            *slot = value.clone();
        }
        self.inner.version.set(self.inner.version.get() + 1);
        self.inner.changed.emit(&value);
    }

    /// Mutate in place, notifying subscribers if the result differs.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let mut next = self.get();
        f(&mut next);
        self.set(next);
    }

    /// Number of effective mutations so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Subscribe to value changes.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.inner.changed.subscribe(callback)
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.changed.subscriber_count()
    }

    /// Non-owning handle to the same value.
    #[must_use]
    pub fn downgrade(&self) -> WeakObservable<T> {
        WeakObservable {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

impl<T: Clone + PartialEq + Default + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Non-owning handle to an [`Observable`].
pub struct WeakObservable<T> {
    inner: Weak<ObservableInner<T>>,
}

impl<T> Clone for WeakObservable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for WeakObservable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakObservable")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl<T> WeakObservable<T> {
    /// Strong handle, or `None` once every `Observable` clone was dropped.
    #[must_use]
    pub fn upgrade(&self) -> Option<Observable<T>> {
        self.inner.upgrade().map(|inner| Observable { inner })
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_set_roundtrip() {
        let obs = Observable::new(false);
        obs.set(true);
        assert!(obs.get());
    }

    #[test]
    fn equal_set_is_noop() {
        let obs = Observable::new(String::from("default"));
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let _sub = obs.subscribe(move |_| h.set(h.get() + 1));

        obs.set("default".to_string());
        assert_eq!(obs.version(), 0);
        assert_eq!(hits.get(), 0);

        obs.set("first edit".to_string());
        assert_eq!(obs.version(), 1);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn subscriber_sees_new_value_through_get() {
        let obs = Observable::new(0_i64);
        let seen = Rc::new(Cell::new(-1));
        let reader = obs.clone();
        let s = Rc::clone(&seen);
        let _sub = obs.subscribe(move |_| s.set(reader.get()));

        obs.set(42);
        assert_eq!(seen.get(), 42);
    }

    #[test]
    fn update_mutates_in_place() {
        let obs = Observable::new(vec!["a".to_string()]);
        obs.update(|items| items.push("b".to_string()));
        assert_eq!(obs.get(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(obs.version(), 1);

        obs.update(|_| {});
        assert_eq!(obs.version(), 1, "no-op update must not bump version");
    }

    #[test]
    fn weak_handle_does_not_keep_value_alive() {
        let obs = Observable::new(1_i64);
        let weak = obs.downgrade();
        assert!(weak.is_alive());
        assert_eq!(weak.upgrade().map(|o| o.get()), Some(1));

        drop(obs);
        assert!(!weak.is_alive());
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn with_borrows_without_clone() {
        let obs = Observable::new(vec![1, 2, 3]);
        assert_eq!(obs.with(Vec::len), 3);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn version_counts_effective_sets(values in prop::collection::vec(0_i64..4, 0..32)) {
                let obs = Observable::new(0_i64);
                let mut last = 0;
                let mut changes = 0_u64;
                for v in values {
                    if v != last {
                        changes += 1;
                        last = v;
                    }
                    obs.set(v);
                }
                prop_assert_eq!(obs.version(), changes);
            }
        }
    }
}
