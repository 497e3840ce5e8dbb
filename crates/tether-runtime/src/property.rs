#![forbid(unsafe_code)]

//! The bound-object capability: read, write, and change notification.
//!
//! A settings registry knows nothing about widgets. It needs one thing from
//! each bound object: a [`Property`] it can read, write, and subscribe to.
//! The notification carries no value; subscribers always re-read through
//! [`Property::read`].
//!
//! Implementations in this crate:
//!
//! - [`PropertyBinding<T>`](crate::reactive::PropertyBinding): a named
//!   property backed by a weak handle to an `Observable<T>`.
//! - [`CallbackProperty`]: getter and setter closures plus an external
//!   [`Signal<()>`] for objects that are not observables.
//! - [`MappedProperty<P>`](crate::mapper::MappedProperty): a derived view of
//!   another property.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Error |
//! |---------|-------|-------|
//! | Object dropped | Owner destroyed the widget | [`PropertyError::Detached`] |
//! | Wrong value kind | Stale store value, bad caller | [`PropertyError::TypeMismatch`] |
//! | Mapper domain | Value outside a mapper's domain | [`PropertyError::OutOfDomain`] |

use std::rc::Rc;

use tether_core::{Value, ValueKind};

use crate::reactive::{Signal, Subscription};

/// Errors raised by a [`Property`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PropertyError {
    #[error("property '{property}' is detached from its object")]
    Detached { property: String },

    #[error("property '{property}' expects {expected} values, got {found}")]
    TypeMismatch {
        property: String,
        expected: ValueKind,
        found: ValueKind,
    },

    #[error("mapper '{mapper}' cannot map {value:?}")]
    OutOfDomain { mapper: String, value: Value },
}

impl PropertyError {
    #[must_use]
    pub fn detached(property: impl Into<String>) -> Self {
        Self::Detached {
            property: property.into(),
        }
    }

    #[must_use]
    pub fn type_mismatch(property: impl Into<String>, expected: ValueKind, found: ValueKind) -> Self {
        Self::TypeMismatch {
            property: property.into(),
            expected,
            found,
        }
    }

    #[must_use]
    pub fn out_of_domain(mapper: impl Into<String>, value: Value) -> Self {
        Self::OutOfDomain {
            mapper: mapper.into(),
            value,
        }
    }

    /// Whether the bound object is gone (as opposed to a logic error).
    #[must_use]
    pub fn is_detached(&self) -> bool {
        matches!(self, Self::Detached { .. })
    }
}

/// One observable property of one bound object.
pub trait Property {
    /// Property name, for diagnostics (e.g. `"checked"`, `"complement"`).
    fn name(&self) -> &str;

    /// Pull the live value from the object.
    fn read(&self) -> Result<Value, PropertyError>;

    /// Push `value` into the object. The object raises its change
    /// notification if the live value changed.
    fn write(&self, value: Value) -> Result<(), PropertyError>;

    /// Call `on_change` whenever the live value changes, for as long as the
    /// returned [`Subscription`] is held.
    fn subscribe(&self, on_change: Rc<dyn Fn()>) -> Result<Subscription, PropertyError>;
}

impl<P: Property + ?Sized> Property for Rc<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn read(&self) -> Result<Value, PropertyError> {
        (**self).read()
    }

    fn write(&self, value: Value) -> Result<(), PropertyError> {
        (**self).write(value)
    }

    fn subscribe(&self, on_change: Rc<dyn Fn()>) -> Result<Subscription, PropertyError> {
        (**self).subscribe(on_change)
    }
}

impl<P: Property + ?Sized> Property for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn read(&self) -> Result<Value, PropertyError> {
        (**self).read()
    }

    fn write(&self, value: Value) -> Result<(), PropertyError> {
        (**self).write(value)
    }

    fn subscribe(&self, on_change: Rc<dyn Fn()>) -> Result<Subscription, PropertyError> {
        (**self).subscribe(on_change)
    }
}

type Getter = dyn Fn() -> Result<Value, PropertyError>;
type Setter = dyn Fn(Value) -> Result<(), PropertyError>;

/// A property made of explicit getter and setter closures.
///
/// The object owning the state raises `changed` itself; the setter is not
/// expected to emit it (though it may).
pub struct CallbackProperty {
    name: String,
    getter: Box<Getter>,
    setter: Box<Setter>,
    changed: Signal<()>,
}

impl CallbackProperty {
    pub fn new(
        name: impl Into<String>,
        getter: impl Fn() -> Result<Value, PropertyError> + 'static,
        setter: impl Fn(Value) -> Result<(), PropertyError> + 'static,
        changed: &Signal<()>,
    ) -> Self {
        Self {
            name: name.into(),
            getter: Box::new(getter),
            setter: Box::new(setter),
            changed: changed.clone(),
        }
    }
}

impl std::fmt::Debug for CallbackProperty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackProperty")
            .field("name", &self.name)
            .field("changed", &self.changed)
            .finish_non_exhaustive()
    }
}

impl Property for CallbackProperty {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self) -> Result<Value, PropertyError> {
        (self.getter)()
    }

    fn write(&self, value: Value) -> Result<(), PropertyError> {
        (self.setter)(value)
    }

    fn subscribe(&self, on_change: Rc<dyn Fn()>) -> Result<Subscription, PropertyError> {
        Ok(self.changed.subscribe(move |()| on_change()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    fn counter_property(state: &Rc<RefCell<i64>>, changed: &Signal<()>) -> CallbackProperty {
        let read_state = Rc::clone(state);
        let write_state = Rc::clone(state);
        let notify = changed.clone();
        CallbackProperty::new(
            "count",
            move || Ok(Value::Int(*read_state.borrow())),
            move |value| {
                let n = i64::try_from(value).map_err(|e| {
                    PropertyError::type_mismatch("count", e.expected, e.found)
                })?;
                *write_state.borrow_mut() = n;
                notify.emit(&());
                Ok(())
            },
            changed,
        )
    }

    #[test]
    fn callback_property_reads_and_writes() {
        let state = Rc::new(RefCell::new(3));
        let changed = Signal::new();
        let prop = counter_property(&state, &changed);

        assert_eq!(prop.name(), "count");
        assert_eq!(prop.read(), Ok(Value::Int(3)));
        prop.write(Value::Int(9)).unwrap();
        assert_eq!(*state.borrow(), 9);
    }

    #[test]
    fn callback_property_notifies_subscribers() {
        let state = Rc::new(RefCell::new(0));
        let changed = Signal::new();
        let prop = counter_property(&state, &changed);

        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let sub = prop.subscribe(Rc::new(move || h.set(h.get() + 1))).unwrap();

        prop.write(Value::Int(1)).unwrap();
        changed.emit(&());
        assert_eq!(hits.get(), 2);

        drop(sub);
        changed.emit(&());
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn callback_property_rejects_wrong_kind() {
        let state = Rc::new(RefCell::new(0));
        let changed = Signal::new();
        let prop = counter_property(&state, &changed);

        let err = prop.write(Value::Bool(true)).unwrap_err();
        assert_eq!(
            err,
            PropertyError::type_mismatch("count", ValueKind::Int, ValueKind::Bool)
        );
        assert!(!err.is_detached());
    }

    #[test]
    fn rc_property_forwards() {
        let state = Rc::new(RefCell::new(5));
        let changed = Signal::new();
        let prop: Rc<dyn Property> = Rc::new(counter_property(&state, &changed));
        assert_eq!(prop.read(), Ok(Value::Int(5)));
        assert_eq!(prop.name(), "count");
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            PropertyError::detached("checked").to_string(),
            "property 'checked' is detached from its object"
        );
        assert_eq!(
            PropertyError::out_of_domain("complement", Value::Int(2)).to_string(),
            "mapper 'complement' cannot map Int(2)"
        );
    }
}
