#![forbid(unsafe_code)]

//! Per-setting registration metadata.

bitflags::bitflags! {
    /// Flags attached to a registered setting.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SettingOptions: u8 {
        /// A committed change only takes effect after an application
        /// restart. Surfaced by
        /// [`changed_settings_requiring_restart`](crate::SettingsRegistry::changed_settings_requiring_restart).
        const REQUIRE_RESTART = 0b0000_0001;
    }
}

/// Optional metadata for [`register_property_with`](crate::SettingsRegistry::register_property_with).
///
/// ```ignore
/// registry.register_property_with(
///     "render/backend",
///     backend.property(),
///     Registration::new().label("Rendering backend").require_restart(),
/// )?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registration {
    pub label: Option<String>,
    pub options: SettingOptions,
}

impl Registration {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Human-readable name shown next to the setting.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn options(mut self, options: SettingOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn require_restart(mut self) -> Self {
        self.options |= SettingOptions::REQUIRE_RESTART;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registration_is_bare() {
        let reg = Registration::new();
        assert_eq!(reg.label, None);
        assert!(reg.options.is_empty());
    }

    #[test]
    fn builder_sets_label_and_flags() {
        let reg = Registration::new().label("Show toolbar").require_restart();
        assert_eq!(reg.label.as_deref(), Some("Show toolbar"));
        assert!(reg.options.contains(SettingOptions::REQUIRE_RESTART));
    }

    #[test]
    fn options_replaces_flags() {
        let reg = Registration::new()
            .require_restart()
            .options(SettingOptions::empty());
        assert_eq!(reg.options, SettingOptions::empty());
    }
}
