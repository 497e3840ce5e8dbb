#![forbid(unsafe_code)]

//! Property bindings over [`Observable`] values.
//!
//! A [`PropertyBinding<T>`] names one property of one bound object and holds
//! a *weak* handle to the observable backing it. The object's owner (a
//! panel, a window) decides its lifetime; the binding only reports
//! [`PropertyError::Detached`] once it is gone.
//!
//! # Usage
//!
//! ```ignore
//! use tether_runtime::reactive::{Observable, PropertyBinding};
//!
//! let checked = Observable::new(false);
//! let binding = PropertyBinding::new("checked", &checked);
//!
//! checked.set(true);
//! assert_eq!(binding.read()?, Value::Bool(true));
//!
//! binding.write(Value::Bool(false))?;
//! assert!(!checked.get());
//! ```
//!
//! # Invariants
//!
//! 1. `read()` always returns the current (not stale) value.
//! 2. A write issued from inside this binding's own change notification is
//!    dropped, which breaks write → notify → write cycles.
//! 3. Dropping the bound observable detaches the binding; it never panics.
//!
//! # Failure Modes
//!
//! - Observable dropped: `read`, `write` and `subscribe` return `Detached`.
//! - Value of the wrong kind: `write` returns `TypeMismatch` and leaves the
//!   observable untouched.

use std::cell::Cell;
use std::rc::Rc;

use tether_core::{PropertyValue, Value};

use super::observable::{Observable, WeakObservable};
use super::signal::Subscription;
use crate::property::{Property, PropertyError};

/// A named property backed by a weak handle to an [`Observable<T>`].
pub struct PropertyBinding<T> {
    name: String,
    source: WeakObservable<T>,
    writing: Rc<Cell<bool>>,
}

impl<T: PropertyValue> PropertyBinding<T> {
    /// Bind property `name` to `source` without taking ownership of it.
    pub fn new(name: impl Into<String>, source: &Observable<T>) -> Self {
        Self {
            name: name.into(),
            source: source.downgrade(),
            writing: Rc::new(Cell::new(false)),
        }
    }

    /// Whether the bound observable is still alive.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.source.is_alive()
    }

    fn source(&self) -> Result<Observable<T>, PropertyError> {
        self.source
            .upgrade()
            .ok_or_else(|| PropertyError::detached(&self.name))
    }
}

impl<T> Clone for PropertyBinding<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            source: self.source.clone(),
            writing: Rc::clone(&self.writing),
        }
    }
}

impl<T> std::fmt::Debug for PropertyBinding<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyBinding")
            .field("name", &self.name)
            .field("attached", &self.source.is_alive())
            .finish()
    }
}

impl<T: PropertyValue> Property for PropertyBinding<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self) -> Result<Value, PropertyError> {
        Ok(self.source()?.get().into())
    }

    fn write(&self, value: Value) -> Result<(), PropertyError> {
        let source = self.source()?;
        let typed = T::try_from(value)
            .map_err(|e| PropertyError::type_mismatch(&self.name, e.expected, e.found))?;
        if self.writing.get() {
            tracing::trace!(
                message = "binding.reentrant_write_dropped",
                property = %self.name
            );
            return Ok(());
        }
        self.writing.set(true);
        source.set(typed);
        self.writing.set(false);
        Ok(())
    }

    fn subscribe(&self, on_change: Rc<dyn Fn()>) -> Result<Subscription, PropertyError> {
        let source = self.source()?;
        Ok(source.subscribe(move |_| on_change()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_core::ValueKind;

    #[test]
    fn binding_reads_live_value() {
        let checked = Observable::new(false);
        let binding = PropertyBinding::new("checked", &checked);
        assert_eq!(binding.read(), Ok(Value::Bool(false)));

        checked.set(true);
        assert_eq!(binding.read(), Ok(Value::Bool(true)));
    }

    #[test]
    fn binding_write_updates_source() {
        let text = Observable::new(String::from("default"));
        let binding = PropertyBinding::new("text", &text);
        binding.write(Value::from("first edit")).unwrap();
        assert_eq!(text.get(), "first edit");
    }

    #[test]
    fn binding_write_rejects_wrong_kind() {
        let list = Observable::new(Vec::<String>::new());
        let binding = PropertyBinding::new("list", &list);
        let err = binding.write(Value::from("nope")).unwrap_err();
        assert_eq!(
            err,
            PropertyError::type_mismatch("list", ValueKind::List, ValueKind::Text)
        );
        assert_eq!(list.version(), 0);
    }

    #[test]
    fn binding_subscription_fires_on_change() {
        let checked = Observable::new(false);
        let binding = PropertyBinding::new("checked", &checked);
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let _sub = binding
            .subscribe(Rc::new(move || h.set(h.get() + 1)))
            .unwrap();

        checked.set(true);
        binding.write(Value::Bool(false)).unwrap();
        binding.write(Value::Bool(false)).unwrap();
        assert_eq!(hits.get(), 2, "equal writes do not notify");
    }

    #[test]
    fn binding_detaches_when_source_dropped() {
        let checked = Observable::new(true);
        let binding = PropertyBinding::new("checked", &checked);
        assert!(binding.is_attached());

        drop(checked);
        assert!(!binding.is_attached());
        assert!(binding.read().unwrap_err().is_detached());
        assert!(binding.write(Value::Bool(true)).unwrap_err().is_detached());
        assert!(binding.subscribe(Rc::new(|| {})).unwrap_err().is_detached());
    }

    #[test]
    fn binding_does_not_keep_source_alive() {
        let checked = Observable::new(true);
        let weak = checked.downgrade();
        let _binding = PropertyBinding::new("checked", &checked);
        drop(checked);
        assert!(!weak.is_alive());
    }

    #[test]
    fn reentrant_write_is_dropped() {
        let value = Observable::new(0_i64);
        let binding = PropertyBinding::new("value", &value);

        // Writes back into the same binding from its own notification.
        let echo = binding.clone();
        let _sub = binding
            .subscribe(Rc::new(move || {
                echo.write(Value::Int(100)).unwrap();
            }))
            .unwrap();

        binding.write(Value::Int(1)).unwrap();
        assert_eq!(value.get(), 1, "nested write must not cycle");
        assert_eq!(value.version(), 1);
    }

    #[test]
    fn debug_format_reports_attachment() {
        let checked = Observable::new(false);
        let binding = PropertyBinding::new("checked", &checked);
        let debug = format!("{binding:?}");
        assert!(debug.contains("checked"));
        assert!(debug.contains("attached: true"));
    }
}
