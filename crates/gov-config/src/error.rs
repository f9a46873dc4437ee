// SPDX-License-Identifier: Apache-2.0

//! Errors raised while loading or validating platform settings.

/// Errors raised by the configuration loader.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// Failed to read the settings file from disk.
    #[error("failed to read settings file '{path}': {source}")]
    Read {
        /// Path that could not be read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The settings file failed to parse as YAML.
    #[error("failed to parse settings file '{path}': {source}")]
    Parse {
        /// Path that failed to parse.
        path: String,
        /// Underlying parse error.
        #[source]
        source: serde_yaml::Error,
    },

    /// An environment-variable override had a value that didn't parse as the expected type.
    #[error("invalid value for environment override '{var}': '{value}'")]
    InvalidEnvOverride {
        /// The environment variable name.
        var: String,
        /// The value that failed to parse.
        value: String,
    },
}
