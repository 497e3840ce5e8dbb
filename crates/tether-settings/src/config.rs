#![forbid(unsafe_code)]

//! Registry behaviour switches.
//!
//! The defaults reproduce the classic settings-panel behaviour: live edits
//! are mirrored to the store immediately, keys missing from the store are
//! seeded from the live object, and `apply_settings` re-persists every key.
//!
//! With feature `config-file`, a [`RegistryConfig`] can be read from TOML
//! or JSON. Unknown fields are rejected and missing fields take their
//! defaults:
//!
//! ```toml
//! write_through = false
//! persist_unchanged_on_apply = false
//! ```

#[cfg(feature = "config-file")]
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "config-file",
    derive(serde::Serialize, serde::Deserialize),
    serde(default, deny_unknown_fields)
)]
pub struct RegistryConfig {
    /// Write each live edit to the store as soon as it is observed. When
    /// off, the store only changes on register, apply and reset.
    pub write_through: bool,
    /// Write the live value into the store for keys it does not hold yet.
    pub seed_store: bool,
    /// Re-persist clean keys on `apply_settings`, not just dirty ones.
    pub persist_unchanged_on_apply: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            write_through: true,
            seed_store: true,
            persist_unchanged_on_apply: true,
        }
    }
}

impl RegistryConfig {
    #[must_use]
    pub fn with_write_through(mut self, on: bool) -> Self {
        self.write_through = on;
        self
    }

    #[must_use]
    pub fn with_seed_store(mut self, on: bool) -> Self {
        self.seed_store = on;
        self
    }

    #[must_use]
    pub fn with_persist_unchanged_on_apply(mut self, on: bool) -> Self {
        self.persist_unchanged_on_apply = on;
        self
    }
}

/// Failure to load a [`RegistryConfig`].
#[cfg(feature = "config-file")]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported config format for {path} (expected .toml or .json)")]
    UnsupportedFormat { path: PathBuf },
}

#[cfg(feature = "config-file")]
impl RegistryConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Load from a `.toml` or `.json` file, chosen by extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        let read = || {
            std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        };
        let config = match format.as_deref() {
            Some("toml") => Self::from_toml_str(&read()?)?,
            Some("json") => Self::from_json_str(&read()?)?,
            _ => {
                return Err(ConfigError::UnsupportedFormat {
                    path: path.to_path_buf(),
                });
            }
        };
        tracing::debug!(
            message = "settings.config_loaded",
            path = %path.display(),
            write_through = config.write_through,
            seed_store = config.seed_store,
            persist_unchanged_on_apply = config.persist_unchanged_on_apply
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_all_on() {
        let config = RegistryConfig::default();
        assert!(config.write_through);
        assert!(config.seed_store);
        assert!(config.persist_unchanged_on_apply);
    }

    #[test]
    fn builder_toggles_fields() {
        let config = RegistryConfig::default()
            .with_write_through(false)
            .with_seed_store(false);
        assert!(!config.write_through);
        assert!(!config.seed_store);
        assert!(config.persist_unchanged_on_apply);
    }

    #[cfg(feature = "config-file")]
    mod file {
        use super::super::*;
        use std::io::Write;

        #[test]
        fn toml_missing_fields_default() {
            let config = RegistryConfig::from_toml_str("write_through = false\n").unwrap();
            assert_eq!(config, RegistryConfig::default().with_write_through(false));
        }

        #[test]
        fn toml_rejects_unknown_fields() {
            let err = RegistryConfig::from_toml_str("autosave = true\n").unwrap_err();
            assert!(matches!(err, ConfigError::Toml(_)));
        }

        #[test]
        fn json_parses() {
            let config =
                RegistryConfig::from_json_str(r#"{"persist_unchanged_on_apply": false}"#).unwrap();
            assert!(!config.persist_unchanged_on_apply);
            assert!(config.write_through);
        }

        #[test]
        fn load_picks_format_by_extension() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("registry.toml");
            let mut file = std::fs::File::create(&path).unwrap();
            writeln!(file, "seed_store = false").unwrap();
            drop(file);

            let config = RegistryConfig::load(&path).unwrap();
            assert!(!config.seed_store);
        }

        #[test]
        fn load_rejects_unknown_extension() {
            let err = RegistryConfig::load("registry.yaml").unwrap_err();
            assert!(matches!(err, ConfigError::UnsupportedFormat { .. }));
        }

        #[test]
        fn load_reports_missing_file() {
            let dir = tempfile::tempdir().unwrap();
            let err = RegistryConfig::load(dir.path().join("absent.json")).unwrap_err();
            assert!(matches!(err, ConfigError::Io { .. }));
            assert!(err.to_string().starts_with("failed to read config"));
        }
    }
}
