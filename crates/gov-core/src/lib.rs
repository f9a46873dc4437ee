// SPDX-License-Identifier: Apache-2.0

//! Shared data model for the feature governance platform.
//!
//! Every other crate in the workspace builds on the types defined here:
//! [`FeatureKey`], [`MetricBundle`], [`TelemetryMessage`], and the resource
//! taxonomy ([`ResourceTag`]) that the rest of the control plane reasons
//! about. Nothing in this crate talks to a queue, a KV store, or SQL — it
//! is pure data plus the invariants that hold over it.

/// Error kind shared by the data model's fallible constructors.
pub mod error;
/// The `project:category:feature` identifier and its parsing rules.
pub mod feature_key;
/// `MetricBundle`, `ResourceTag`, and BCU/cost-relevant resource metadata.
pub mod metrics;
/// `TelemetryMessage`, `TraceContext`, and error/heartbeat payload shapes.
pub mod message;
/// Time-bucket helpers (hourly/daily/monthly) shared by rollups and the scheduler.
pub mod time_bucket;

pub use error::CoreError;
pub use feature_key::FeatureKey;
pub use message::{ErrorCategory, TelemetryMessage, TraceContext};
pub use metrics::{MetricBundle, ResourceTag};
pub use time_bucket::TimeBucket;
