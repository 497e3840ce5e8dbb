#![forbid(unsafe_code)]

//! tether public facade crate.
//!
//! Re-exports the value model, reactive bindings and settings registry under
//! one roof. Most callers only need the [`prelude`].

pub use tether_core as core;
pub use tether_runtime as runtime;
pub use tether_settings as settings;

pub mod prelude {
    pub use tether_core::{MemoryStore, StoreError, Value, ValueKind, ValueStore};
    #[cfg(feature = "file-store")]
    pub use tether_core::JsonFileStore;
    pub use tether_runtime::{
        CallbackProperty, MappedProperty, Observable, Property, PropertyBinding, PropertyError,
        Signal, Subscription, ValueMapper,
    };
    pub use tether_settings::{
        EntryState, PersistenceReport, Registration, RegistryConfig, SettingChanged,
        SettingOptions, SettingSnapshot, SettingsError, SettingsRegistry,
    };
}
