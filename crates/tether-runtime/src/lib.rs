#![forbid(unsafe_code)]

//! Reactive primitives, property bindings and value mappers for tether.

pub mod mapper;
pub mod property;
pub mod reactive;

pub use mapper::{MappedProperty, ValueMapper};
pub use property::{CallbackProperty, Property, PropertyError};
pub use reactive::{Observable, PropertyBinding, Signal, Subscription, WeakObservable};
