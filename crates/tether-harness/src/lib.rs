#![forbid(unsafe_code)]

//! Reference fixtures for exercising the settings registry.
//!
//! - [`fixtures`]: stand-ins for the controls a settings panel binds
//!   (check box, line edit, string list editor). Each owns its live state as
//!   an [`Observable`](tether_runtime::Observable) and hands out
//!   non-owning property bindings.
//! - [`flaky_store`]: a [`ValueStore`](tether_core::ValueStore) that fails on
//!   demand and counts writes.

pub mod fixtures;
pub mod flaky_store;

pub use fixtures::{CheckBox, LineEdit, ListEditor};
pub use flaky_store::FlakyStore;
