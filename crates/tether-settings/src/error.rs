#![forbid(unsafe_code)]

//! Errors surfaced by the settings registry.
//!
//! `NotFound`, `EmptyKey` and `InvariantViolation` are programmer errors:
//! they abort the operation that raised them and nothing else.
//! Persistence failures are different. Batch operations keep going, collect
//! every failing key into one [`PersistenceReport`], and return it once the
//! whole pass is done. The in-memory slots are already updated by then.
//! When an `InvariantViolation` stops a pass, the failures collected before
//! it ride along on the error.

use tether_core::StoreError;
use tether_runtime::PropertyError;

pub type Result<T> = std::result::Result<T, SettingsError>;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("setting '{key}' is not registered")]
    NotFound { key: String },

    #[error("setting keys must not be empty")]
    EmptyKey,

    #[error("invariant violated for setting '{key}': {source}")]
    InvariantViolation {
        key: String,
        #[source]
        source: PropertyError,
        /// Store failures of the pass before it stopped.
        partial: PersistenceReport,
    },

    #[error(transparent)]
    Persistence(#[from] PersistenceReport),
}

impl SettingsError {
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    #[must_use]
    pub fn invariant(key: impl Into<String>, source: PropertyError) -> Self {
        Self::InvariantViolation {
            key: key.into(),
            source,
            partial: PersistenceReport::new(),
        }
    }

    /// Attach the store failures a pass collected before it stopped.
    #[must_use]
    pub(crate) fn with_partial(mut self, report: PersistenceReport) -> Self {
        if let Self::InvariantViolation { partial, .. } = &mut self {
            *partial = report;
        }
        self
    }

    /// The persistence report: the whole error for `Persistence`, the
    /// failures seen before the abort for a non-empty `InvariantViolation`.
    #[must_use]
    pub fn persistence(&self) -> Option<&PersistenceReport> {
        match self {
            Self::Persistence(report) => Some(report),
            Self::InvariantViolation { partial, .. } if !partial.is_empty() => Some(partial),
            _ => None,
        }
    }
}

/// One key the store refused to persist.
#[derive(Debug)]
pub struct PersistenceFailure {
    pub key: String,
    pub error: StoreError,
}

/// Every persistence failure of one registry operation.
#[derive(Debug, Default, thiserror::Error)]
#[error("{}", self.summary())]
pub struct PersistenceReport {
    failures: Vec<PersistenceFailure>,
    sync_error: Option<StoreError>,
}

impl PersistenceReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, error: StoreError) {
        self.failures.push(PersistenceFailure {
            key: key.into(),
            error,
        });
    }

    pub fn set_sync_error(&mut self, error: StoreError) {
        self.sync_error = Some(error);
    }

    #[must_use]
    pub fn failures(&self) -> &[PersistenceFailure] {
        &self.failures
    }

    /// Failed keys, in the order the pass visited them.
    #[must_use]
    pub fn failed_keys(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.key.as_str()).collect()
    }

    #[must_use]
    pub fn sync_error(&self) -> Option<&StoreError> {
        self.sync_error.as_ref()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty() && self.sync_error.is_none()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.failures.len() + usize::from(self.sync_error.is_some())
    }

    /// `Ok(())` when nothing failed, the report as an error otherwise.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(SettingsError::Persistence(self))
        }
    }

    fn summary(&self) -> String {
        let mut out = format!(
            "failed to persist {} setting(s)",
            self.failures.len()
        );
        if !self.failures.is_empty() {
            out.push_str(": ");
            out.push_str(&self.failed_keys().join(", "));
        }
        if let Some(err) = &self.sync_error {
            out.push_str(&format!("; sync failed: {err}"));
        }
        out
    }
}
