#![forbid(unsafe_code)]

//! Reactive primitives for bound objects.
//!
//! - [`Signal`]: value-less multicast notification.
//! - [`Subscription`]: RAII guard that unsubscribes on drop.
//! - [`Observable`]: shared, version-tracked value that notifies on change.
//! - [`WeakObservable`]: non-owning handle to an `Observable`.
//! - [`PropertyBinding`]: a named [`Property`](crate::Property) over a weak
//!   `Observable` handle.
//!
//! # Architecture
//!
//! Everything is single-threaded: `Rc`, `RefCell` and `Cell`. Subscribers
//! are stored as `Weak` callbacks and cleaned up lazily during notification.
//! No internal borrow is held while callbacks run, so a callback may read
//! the value that just changed, or write to other observables.
//!
//! # Invariants
//!
//! 1. Subscribers are notified in registration order.
//! 2. Setting a value equal to the current value is a no-op.
//! 3. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.

pub mod binding;
pub mod observable;
pub mod signal;

pub use binding::PropertyBinding;
pub use observable::{Observable, WeakObservable};
pub use signal::{Signal, Subscription};
