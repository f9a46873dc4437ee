// SPDX-License-Identifier: Apache-2.0

//! Errors raised while constructing or validating core data-model types.

/// Errors raised by the data model's fallible constructors.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A `FeatureKey` string did not have exactly two `:` separators.
    #[error("invalid feature key '{0}': expected exactly two ':' separators")]
    MalformedFeatureKey(String),

    /// A `FeatureKey` component (project, category, or feature) was empty.
    #[error("invalid feature key '{0}': components must be nonempty")]
    EmptyFeatureKeyComponent(String),

    /// A `TelemetryMessage`'s `project:category:feature` fields did not match its `feature_key`.
    #[error(
        "telemetry message feature_key '{feature_key}' does not match project:category:feature '{derived}'"
    )]
    FeatureKeyMismatch {
        /// The `feature_key` field as sent.
        feature_key: String,
        /// The key derived from `project`, `category`, and `feature`.
        derived: String,
    },
}
