// SPDX-License-Identifier: Apache-2.0

//! Platform settings: the canonical configuration keys, a layered loader
//! (defaults → file → environment overrides), and the
//! `usage_settings(project, setting_key, setting_value)` per-project
//! override model.

/// Loader errors.
pub mod error;
/// Layered defaults/file/env loading.
pub mod loader;
/// Per-project setting overrides (`usage_settings` table model).
pub mod overrides;
/// The canonical `PlatformSettings` struct and its defaults.
pub mod settings;

pub use error::ConfigError;
pub use loader::load;
pub use overrides::SettingsOverrides;
pub use settings::PlatformSettings;
