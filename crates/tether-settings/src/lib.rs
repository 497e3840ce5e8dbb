#![forbid(unsafe_code)]

//! Settings registry with deferred commit and revert.
//!
//! [`SettingsRegistry`] binds settings keys to live [`Property`] bindings,
//! keeps a default / previous / current value per key, mirrors live edits
//! into a [`ValueStore`], and commits or reverts all pending edits as one
//! batch.
//!
//! ```ignore
//! use tether_settings::SettingsRegistry;
//! use tether_runtime::{MappedProperty, Observable, PropertyBinding};
//!
//! let checked = Observable::new(false);
//! let mut registry = SettingsRegistry::default();
//! registry.register_property("show toolbar", PropertyBinding::new("checked", &checked))?;
//! registry.register_property(
//!     "hide toolbar",
//!     MappedProperty::complement(PropertyBinding::new("checked", &checked)),
//! )?;
//!
//! checked.set(true);
//! assert_eq!(registry.changed_settings(), ["show toolbar", "hide toolbar"]);
//! registry.reset_settings()?;
//! assert!(!checked.get());
//! ```
//!
//! # Modules
//!
//! - [`registry`]: registration, live-edit mirroring, accessors.
//! - [`controller`]: `apply_settings`, `reset_settings`,
//!   `reset_default_settings`.
//! - [`tracker`]: clean/dirty classification.
//! - [`config`]: behaviour switches, optionally loaded from TOML/JSON.
//!
//! [`Property`]: tether_runtime::Property
//! [`ValueStore`]: tether_core::ValueStore

pub mod config;
pub mod controller;
mod entry;
pub mod error;
pub mod options;
pub mod registry;
pub mod tracker;

#[cfg(feature = "config-file")]
pub use config::ConfigError;
pub use config::RegistryConfig;
pub use entry::SettingSnapshot;
pub use error::{PersistenceFailure, PersistenceReport, Result, SettingsError};
pub use options::{Registration, SettingOptions};
pub use registry::{SettingChanged, SettingsRegistry};
pub use tracker::EntryState;
