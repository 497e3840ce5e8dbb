#![forbid(unsafe_code)]

//! Derived properties: a transformed view of another property.
//!
//! [`MappedProperty`] lets one underlying object back several differently
//! shaped settings keys. A check box's `checked` flag can be registered once
//! as itself and once as its complement (`"hide toolbar"` vs `"show
//! toolbar"`) without touching the widget.
//!
//! The transform is a [`ValueMapper`]: a forward function applied on read
//! and its inverse applied on write.
//!
//! # Invariants
//!
//! 1. `read() == forward(inner.read())` and `write(v) == inner.write(inverse(v))`.
//! 2. The inner notification is forwarded unchanged.
//! 3. A value outside the mapper's domain is an error, never coerced.
//!
//! Forward and inverse are *assumed* to be true inverses. Nothing checks it;
//! a `Custom` mapper that is not invertible round-trips incorrectly.

use std::rc::Rc;

use tether_core::{Value, ValueKind};

use crate::property::{Property, PropertyError};
use crate::reactive::Subscription;

type MapFn = dyn Fn(&Value) -> Option<Value>;

/// A forward/inverse pair over [`Value`]s.
#[derive(Clone)]
pub enum ValueMapper {
    /// Logical NOT over booleans. Its own inverse.
    Complement,
    /// Boolean exposed as one of two integers.
    BoolAsInt { true_value: i64, false_value: i64 },
    /// Boolean exposed as one of two strings.
    BoolAsText {
        true_value: String,
        false_value: String,
    },
    /// Caller supplied pair. `None` means "outside the domain".
    Custom {
        name: String,
        forward: Rc<MapFn>,
        inverse: Rc<MapFn>,
    },
}

impl ValueMapper {
    /// `true`/`false` as `1`/`0`.
    #[must_use]
    pub const fn bool_as_int() -> Self {
        Self::BoolAsInt {
            true_value: 1,
            false_value: 0,
        }
    }

    #[must_use]
    pub fn bool_as_text(true_value: impl Into<String>, false_value: impl Into<String>) -> Self {
        Self::BoolAsText {
            true_value: true_value.into(),
            false_value: false_value.into(),
        }
    }

    pub fn custom(
        name: impl Into<String>,
        forward: impl Fn(&Value) -> Option<Value> + 'static,
        inverse: impl Fn(&Value) -> Option<Value> + 'static,
    ) -> Self {
        Self::Custom {
            name: name.into(),
            forward: Rc::new(forward),
            inverse: Rc::new(inverse),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Complement => "complement",
            Self::BoolAsInt { .. } => "bool-as-int",
            Self::BoolAsText { .. } => "bool-as-text",
            Self::Custom { name, .. } => name,
        }
    }

    /// Map an inner value to the derived value.
    pub fn forward(&self, value: &Value) -> Result<Value, PropertyError> {
        match self {
            Self::Complement => Ok(Value::Bool(!self.expect_bool(value)?)),
            Self::BoolAsInt {
                true_value,
                false_value,
            } => Ok(Value::Int(if self.expect_bool(value)? {
                *true_value
            } else {
                *false_value
            })),
            Self::BoolAsText {
                true_value,
                false_value,
            } => Ok(Value::Text(if self.expect_bool(value)? {
                true_value.clone()
            } else {
                false_value.clone()
            })),
            Self::Custom { forward, .. } => {
                forward(value).ok_or_else(|| self.out_of_domain(value))
            }
        }
    }

    /// Map a derived value back to the inner value.
    pub fn inverse(&self, value: &Value) -> Result<Value, PropertyError> {
        match self {
            Self::Complement => Ok(Value::Bool(!self.expect_bool(value)?)),
            Self::BoolAsInt {
                true_value,
                false_value,
            } => match value {
                Value::Int(n) if n == true_value => Ok(Value::Bool(true)),
                Value::Int(n) if n == false_value => Ok(Value::Bool(false)),
                Value::Int(_) => Err(self.out_of_domain(value)),
                other => Err(self.mismatch(ValueKind::Int, other)),
            },
            Self::BoolAsText {
                true_value,
                false_value,
            } => match value {
                Value::Text(s) if s == true_value => Ok(Value::Bool(true)),
                Value::Text(s) if s == false_value => Ok(Value::Bool(false)),
                Value::Text(_) => Err(self.out_of_domain(value)),
                other => Err(self.mismatch(ValueKind::Text, other)),
            },
            Self::Custom { inverse, .. } => {
                inverse(value).ok_or_else(|| self.out_of_domain(value))
            }
        }
    }

    fn expect_bool(&self, value: &Value) -> Result<bool, PropertyError> {
        value
            .as_bool()
            .ok_or_else(|| self.mismatch(ValueKind::Bool, value))
    }

    fn mismatch(&self, expected: ValueKind, found: &Value) -> PropertyError {
        PropertyError::type_mismatch(self.name(), expected, found.kind())
    }

    fn out_of_domain(&self, value: &Value) -> PropertyError {
        PropertyError::out_of_domain(self.name(), value.clone())
    }
}

impl std::fmt::Debug for ValueMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Complement => f.write_str("Complement"),
            Self::BoolAsInt {
                true_value,
                false_value,
            } => f
                .debug_struct("BoolAsInt")
                .field("true_value", true_value)
                .field("false_value", false_value)
                .finish(),
            Self::BoolAsText {
                true_value,
                false_value,
            } => f
                .debug_struct("BoolAsText")
                .field("true_value", true_value)
                .field("false_value", false_value)
                .finish(),
            Self::Custom { name, .. } => f
                .debug_struct("Custom")
                .field("name", name)
                .finish_non_exhaustive(),
        }
    }
}

/// A [`Property`] presenting `mapper` applied to `inner`.
#[derive(Debug)]
pub struct MappedProperty<P> {
    name: String,
    inner: P,
    mapper: ValueMapper,
}

impl<P: Property> MappedProperty<P> {
    pub fn new(name: impl Into<String>, inner: P, mapper: ValueMapper) -> Self {
        Self {
            name: name.into(),
            inner,
            mapper,
        }
    }

    /// The boolean complement of `inner`, named `"complement"`.
    pub fn complement(inner: P) -> Self {
        Self::new("complement", inner, ValueMapper::Complement)
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn mapper(&self) -> &ValueMapper {
        &self.mapper
    }
}

impl<P: Property> Property for MappedProperty<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self) -> Result<Value, PropertyError> {
        self.mapper.forward(&self.inner.read()?)
    }

    fn write(&self, value: Value) -> Result<(), PropertyError> {
        self.inner.write(self.mapper.inverse(&value)?)
    }

    fn subscribe(&self, on_change: Rc<dyn Fn()>) -> Result<Subscription, PropertyError> {
        self.inner.subscribe(on_change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{Observable, PropertyBinding};
    use std::cell::Cell;

    #[test]
    fn complement_reads_negated() {
        let checked = Observable::new(false);
        let prop = MappedProperty::complement(PropertyBinding::new("checked", &checked));
        assert_eq!(prop.read(), Ok(Value::Bool(true)));

        checked.set(true);
        assert_eq!(prop.read(), Ok(Value::Bool(false)));
    }

    #[test]
    fn complement_round_trips_every_bool() {
        let checked = Observable::new(false);
        let prop = MappedProperty::complement(PropertyBinding::new("checked", &checked));
        for v in [false, true, true, false] {
            prop.write(Value::Bool(v)).unwrap();
            assert_eq!(prop.read(), Ok(Value::Bool(v)));
            assert_eq!(checked.get(), !v);
        }
    }

    #[test]
    fn mapped_property_forwards_notification() {
        let checked = Observable::new(false);
        let prop = MappedProperty::complement(PropertyBinding::new("checked", &checked));
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let _sub = prop.subscribe(Rc::new(move || h.set(h.get() + 1))).unwrap();

        checked.set(true);
        assert_eq!(hits.get(), 1);
        assert_eq!(prop.name(), "complement");
        assert_eq!(prop.inner().name(), "checked");
    }

    #[test]
    fn bool_as_int_is_strict_on_inverse() {
        let flag = Observable::new(true);
        let prop = MappedProperty::new(
            "valueAsInt",
            PropertyBinding::new("checked", &flag),
            ValueMapper::bool_as_int(),
        );
        assert_eq!(prop.read(), Ok(Value::Int(1)));

        prop.write(Value::Int(0)).unwrap();
        assert!(!flag.get());

        let err = prop.write(Value::Int(7)).unwrap_err();
        assert_eq!(err, PropertyError::out_of_domain("bool-as-int", Value::Int(7)));
        assert!(!flag.get(), "rejected write leaves the object untouched");
    }

    #[test]
    fn bool_as_text_maps_both_ways() {
        let flag = Observable::new(false);
        let prop = MappedProperty::new(
            "valueAsString",
            PropertyBinding::new("checked", &flag),
            ValueMapper::bool_as_text("on", "off"),
        );
        assert_eq!(prop.read(), Ok(Value::from("off")));
        prop.write(Value::from("on")).unwrap();
        assert!(flag.get());

        let err = prop.write(Value::Bool(true)).unwrap_err();
        assert_eq!(
            err,
            PropertyError::type_mismatch("bool-as-text", ValueKind::Text, ValueKind::Bool)
        );
    }

    #[test]
    fn complement_over_non_bool_is_type_mismatch() {
        let text = Observable::new(String::from("x"));
        let prop = MappedProperty::complement(PropertyBinding::new("text", &text));
        assert_eq!(
            prop.read(),
            Err(PropertyError::type_mismatch(
                "complement",
                ValueKind::Bool,
                ValueKind::Text
            ))
        );
    }

    #[test]
    fn custom_mapper_reports_out_of_domain() {
        let level = Observable::new(2_i64);
        let mapper = ValueMapper::custom(
            "level-name",
            |v| match v.as_int()? {
                1 => Some(Value::from("low")),
                2 => Some(Value::from("high")),
                _ => None,
            },
            |v| match v.as_str()? {
                "low" => Some(Value::Int(1)),
                "high" => Some(Value::Int(2)),
                _ => None,
            },
        );
        let prop = MappedProperty::new("level", PropertyBinding::new("level", &level), mapper);
        assert_eq!(prop.read(), Ok(Value::from("high")));

        prop.write(Value::from("low")).unwrap();
        assert_eq!(level.get(), 1);

        level.set(9);
        assert!(matches!(
            prop.read(),
            Err(PropertyError::OutOfDomain { ref mapper, .. }) if mapper == "level-name"
        ));
    }

    #[test]
    fn mapper_debug_hides_closures() {
        let mapper = ValueMapper::custom("id", |v| Some(v.clone()), |v| Some(v.clone()));
        assert_eq!(format!("{mapper:?}"), "Custom { name: \"id\", .. }");
        assert_eq!(format!("{:?}", ValueMapper::Complement), "Complement");
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn bool_as_int_round_trips(
                t in any::<i64>(),
                f in any::<i64>(),
                writes in prop::collection::vec(any::<bool>(), 1..8),
            ) {
                prop_assume!(t != f);
                let flag = Observable::new(false);
                let prop = MappedProperty::new(
                    "valueAsInt",
                    PropertyBinding::new("checked", &flag),
                    ValueMapper::BoolAsInt { true_value: t, false_value: f },
                );
                for b in writes {
                    let exposed = Value::Int(if b { t } else { f });
                    prop.write(exposed.clone()).unwrap();
                    prop_assert_eq!(flag.get(), b);
                    prop_assert_eq!(prop.read().unwrap(), exposed);
                }
            }
        }
    }
}
