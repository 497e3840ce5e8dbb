#![forbid(unsafe_code)]

//! Value model and key/value store capability for tether.
//!
//! - [`Value`]: the closed set of values a bound property can hold.
//! - [`ValueStore`]: the persistence capability a settings registry mirrors
//!   live edits into.
//! - [`MemoryStore`]: shared in-memory store, the default for tests and for
//!   sessions that never touch disk.
//! - `JsonFileStore` (feature `file-store`): single JSON file with atomic
//!   writes.

#[cfg(feature = "file-store")]
pub mod file_store;
pub mod store;
pub mod value;

#[cfg(feature = "file-store")]
pub use file_store::JsonFileStore;
pub use store::{MemoryStore, StoreError, ValueStore};
pub use value::{PropertyValue, Value, ValueKind, ValueTypeError};
