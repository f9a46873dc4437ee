// SPDX-License-Identifier: Apache-2.0

//! The `project:category:feature` identifier.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Canonical, immutable identifier for a governed feature.
///
/// Invariant: exactly two `:` separators; all three components nonempty.
/// The canonical string form is `project:category:feature` and is what
/// appears in every KVCS key and warehouse row that references a feature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FeatureKey {
    project: String,
    category: String,
    feature: String,
}

impl FeatureKey {
    /// Builds a key from its three components, validating nonemptiness.
    pub fn new(
        project: impl Into<String>,
        category: impl Into<String>,
        feature: impl Into<String>,
    ) -> Result<Self, CoreError> {
        let project = project.into();
        let category = category.into();
        let feature = feature.into();
        let key = Self {
            project,
            category,
            feature,
        };
        key.validate()?;
        Ok(key)
    }

    fn validate(&self) -> Result<(), CoreError> {
        if self.project.is_empty() || self.category.is_empty() || self.feature.is_empty() {
            return Err(CoreError::EmptyFeatureKeyComponent(self.to_string()));
        }
        Ok(())
    }

    /// The `project` component.
    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }

    /// The `category` component.
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// The `feature` component.
    #[must_use]
    pub fn feature(&self) -> &str {
        &self.feature
    }

    /// Returns the KVCS-key-safe canonical form, e.g. `acme:checkout:stripe-charge`.
    #[must_use]
    pub fn as_canonical(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.project, self.category, self.feature)
    }
}

impl FromStr for FeatureKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        let (Some(project), Some(category), Some(feature)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(CoreError::MalformedFeatureKey(s.to_string()));
        };
        if parts.next().is_some() {
            return Err(CoreError::MalformedFeatureKey(s.to_string()));
        }
        // splitn(3, ..) would silently swallow a fourth ':' into `feature`; reject that.
        if feature.contains(':') {
            return Err(CoreError::MalformedFeatureKey(s.to_string()));
        }
        FeatureKey::new(project, category, feature)
    }
}

impl TryFrom<String> for FeatureKey {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FeatureKey> for String {
    fn from(value: FeatureKey) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_through_canonical_string() {
        let key = FeatureKey::new("acme", "checkout", "stripe-charge").unwrap();
        assert_eq!(key.as_canonical(), "acme:checkout:stripe-charge");
        let parsed: FeatureKey = "acme:checkout:stripe-charge".parse().unwrap();
        assert_eq!(key, parsed);
    }

    #[test]
    fn rejects_wrong_separator_count() {
        assert!("acme:checkout".parse::<FeatureKey>().is_err());
        assert!("acme:checkout:stripe:extra".parse::<FeatureKey>().is_err());
    }

    #[test]
    fn rejects_empty_component() {
        assert!(FeatureKey::new("", "checkout", "f").is_err());
        assert!("acme::stripe".parse::<FeatureKey>().is_err());
    }
}
