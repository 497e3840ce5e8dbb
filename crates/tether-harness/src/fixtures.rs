#![forbid(unsafe_code)]

//! Minimal bound controls.
//!
//! User interaction is simulated by the `set_*`/`push`/`clear` methods,
//! which change the live state and raise its change notification exactly as
//! a real control would on input.

use tether_runtime::{MappedProperty, Observable, PropertyBinding};

/// Two-state toggle with a `checked` property.
#[derive(Debug, Clone, Default)]
pub struct CheckBox {
    checked: Observable<bool>,
}

impl CheckBox {
    #[must_use]
    pub fn new(checked: bool) -> Self {
        Self {
            checked: Observable::new(checked),
        }
    }

    #[must_use]
    pub fn is_checked(&self) -> bool {
        self.checked.get()
    }

    pub fn set_checked(&self, checked: bool) {
        self.checked.set(checked);
    }

    pub fn toggle(&self) {
        self.checked.update(|c| *c = !*c);
    }

    /// Binding to the `checked` property.
    #[must_use]
    pub fn property(&self) -> PropertyBinding<bool> {
        PropertyBinding::new("checked", &self.checked)
    }

    /// Binding to the logical complement of `checked`.
    #[must_use]
    pub fn complement_property(&self) -> MappedProperty<PropertyBinding<bool>> {
        MappedProperty::complement(self.property())
    }
}

/// Single-line text input with a `text` property.
#[derive(Debug, Clone, Default)]
pub struct LineEdit {
    text: Observable<String>,
}

impl LineEdit {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Observable::new(text.into()),
        }
    }

    #[must_use]
    pub fn text(&self) -> String {
        self.text.get()
    }

    pub fn set_text(&self, text: impl Into<String>) {
        self.text.set(text.into());
    }

    #[must_use]
    pub fn property(&self) -> PropertyBinding<String> {
        PropertyBinding::new("text", &self.text)
    }
}

/// Editable list of strings with an `items` property.
#[derive(Debug, Clone, Default)]
pub struct ListEditor {
    items: Observable<Vec<String>>,
}

impl ListEditor {
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            items: Observable::new(items.into_iter().map(Into::into).collect()),
        }
    }

    #[must_use]
    pub fn items(&self) -> Vec<String> {
        self.items.get()
    }

    pub fn push(&self, item: impl Into<String>) {
        let item = item.into();
        self.items.update(|items| items.push(item));
    }

    pub fn set_items<I, S>(&self, items: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.items.set(items.into_iter().map(Into::into).collect());
    }

    pub fn clear(&self) {
        self.items.set(Vec::new());
    }

    #[must_use]
    pub fn property(&self) -> PropertyBinding<Vec<String>> {
        PropertyBinding::new("items", &self.items)
    }
}
