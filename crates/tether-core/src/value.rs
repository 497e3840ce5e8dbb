#![forbid(unsafe_code)]

//! Values carried by bound properties and persisted by stores.
//!
//! A [`Value`] is deliberately small: booleans, integers, text, and ordered
//! lists of text cover every property a settings panel binds. Equality is
//! structural, which is what change tracking compares.
//!
//! # Invariants
//!
//! 1. `Value::from(x).kind()` is the kind registered for `x`'s Rust type.
//! 2. `T::try_from(Value::from(x)) == Ok(x)` for every [`PropertyValue`] type.
//! 3. A failed conversion never coerces: it reports both kinds involved.

use core::fmt;

/// A property or store value.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(untagged)
)]
pub enum Value {
    /// A boolean flag (check boxes, toggles).
    Bool(bool),
    /// A signed integer (spin boxes, sliders, enum indices).
    Int(i64),
    /// Free text (line edits, combo box text).
    Text(String),
    /// An ordered sequence of strings (list editors, recent files).
    List(Vec<String>),
}

/// The variant of a [`Value`], without its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Int,
    Text,
    List,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Text => "text",
            Self::List => "list",
        };
        f.write_str(name)
    }
}

impl Value {
    /// Kind of this value.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Text(_) => ValueKind::Text,
            Self::List(_) => ValueKind::List,
        }
    }

    /// An empty string list.
    #[must_use]
    pub const fn empty_list() -> Self {
        Self::List(Vec::new())
    }

    /// Build a list value from anything yielding string-like items.
    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<Vec<&str>> for Value {
    fn from(value: Vec<&str>) -> Self {
        Self::list(value)
    }
}

/// A [`Value`] did not have the kind a conversion expected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("expected a {expected} value, found {found}")]
pub struct ValueTypeError {
    pub expected: ValueKind,
    pub found: ValueKind,
}

macro_rules! value_conversions {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }

            impl TryFrom<Value> for $ty {
                type Error = ValueTypeError;

                fn try_from(value: Value) -> Result<Self, Self::Error> {
                    match value {
                        Value::$variant(inner) => Ok(inner),
                        other => Err(ValueTypeError {
                            expected: ValueKind::$variant,
                            found: other.kind(),
                        }),
                    }
                }
            }
        )+
    };
}

value_conversions! {
    bool => Bool,
    i64 => Int,
    String => Text,
    Vec<String> => List,
}

/// Rust types that can back a bound property.
///
/// Blanket-implemented for every type with lossless conversions to and from
/// [`Value`]; in practice `bool`, `i64`, `String` and `Vec<String>`.
pub trait PropertyValue:
    Clone + PartialEq + Into<Value> + TryFrom<Value, Error = ValueTypeError> + 'static
{
}

impl<T> PropertyValue for T where
    T: Clone + PartialEq + Into<Value> + TryFrom<Value, Error = ValueTypeError> + 'static
{
}
