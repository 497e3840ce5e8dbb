#![forbid(unsafe_code)]

//! Value-less change notification with RAII subscriptions.
//!
//! A [`Signal<T>`] is the notification half of an [`Observable`]: it owns no
//! value, it only fans an event out to subscribers. Bound objects that are
//! not observables raise a `Signal<()>` when their live value changes.
//!
//! # Invariants
//!
//! 1. Subscribers are notified in registration order.
//! 2. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.
//! 3. `emit` holds no internal borrow while callbacks run, so a callback may
//!    subscribe, emit again, or drop subscriptions.
//!
//! [`Observable`]: super::Observable

use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

type Callback<T> = dyn Fn(&T);

/// RAII guard for a signal or observable subscription.
///
/// The guard holds the only strong reference to the callback; the signal
/// keeps a weak one. Dropping the guard therefore detaches the callback.
#[must_use = "dropping a Subscription immediately unsubscribes the callback"]
pub struct Subscription {
    _callback: Box<dyn Any>,
}

impl Subscription {
    fn new<T: 'static>(callback: Rc<Callback<T>>) -> Self {
        Self {
            _callback: Box::new(callback),
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// Multicast notification channel. Clones share the subscriber list.
pub struct Signal<T> {
    subscribers: Rc<RefCell<Vec<Weak<Callback<T>>>>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            subscribers: Rc::clone(&self.subscribers),
        }
    }
}

impl<T: 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Signal<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Register `callback`. It stays registered while the returned
    /// [`Subscription`] is alive.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let callback: Rc<Callback<T>> = Rc::new(callback);
        self.subscribers.borrow_mut().push(Rc::downgrade(&callback));
        Subscription::new(callback)
    }

    /// Notify every live subscriber with `event`.
    pub fn emit(&self, event: &T) {
        let live: Vec<Rc<Callback<T>>> = {
            let mut subscribers = self.subscribers.borrow_mut();
            subscribers.retain(|weak| weak.strong_count() > 0);
            subscribers.iter().filter_map(Weak::upgrade).collect()
        };
        for callback in live {
            callback(event);
        }
    }

    /// Number of subscribers whose guard is still alive.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .borrow()
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}

impl<T> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("subscribers", &self.subscribers.borrow().len())
            .finish()
    }
}
