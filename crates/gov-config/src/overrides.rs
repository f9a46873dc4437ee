// SPDX-License-Identifier: Apache-2.0

//! Per-project setting overrides, modeling the
//! `usage_settings(project, setting_key, setting_value)` warehouse table.
//!
//! Projects may use the literal project id `"all"` to set a global default
//! that applies to every project without its own override.

use std::collections::HashMap;

/// The project id used for global overrides in `usage_settings`.
pub const GLOBAL_PROJECT: &str = "all";

/// In-memory view of the `usage_settings` table: `project -> setting_key -> value`.
///
/// Values are kept as raw strings, matching the warehouse column type; typed
/// access goes through [`SettingsOverrides::resolve`] plus the caller's own
/// parse step, since each setting key has a different target type.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    rows: HashMap<String, HashMap<String, String>>,
}

impl SettingsOverrides {
    /// An empty override set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Upserts one `(project, setting_key) -> setting_value` row.
    pub fn set(&mut self, project: impl Into<String>, key: impl Into<String>, value: impl Into<String>) {
        self.rows
            .entry(project.into())
            .or_default()
            .insert(key.into(), value.into());
    }

    /// Resolves a setting for `project`, falling back to the `"all"` project,
    /// then to `None` if neither has an override (callers fall back further
    /// to [`crate::PlatformSettings`] defaults).
    #[must_use]
    pub fn resolve(&self, project: &str, key: &str) -> Option<&str> {
        self.rows
            .get(project)
            .and_then(|m| m.get(key))
            .or_else(|| self.rows.get(GLOBAL_PROJECT).and_then(|m| m.get(key)))
            .map(String::as_str)
    }
}
