// SPDX-License-Identifier: Apache-2.0

//! The Query Service: the
//! dashboard-facing HTTP surface, backed by a multi-tier read path over an
//! external analytics engine and the relational warehouse's daily rollups.

/// The external analytics-engine abstraction.
pub mod analytics_engine;
/// KVCS-backed daily-rollup read-through cache.
pub mod cache;
/// Errors raised by this crate.
pub mod error;
/// The axum HTTP surface.
pub mod http;
/// The multi-tier read path.
pub mod service;
/// Source-tier labeling and dedup-by-date concatenation.
pub mod tiers;

pub use analytics_engine::{AnalyticsEngine, AnalyticsEngineError};
pub use error::QueryError;
pub use http::{router, run, AppState, ServeError};
pub use service::{QueryResult, QueryService};
pub use tiers::SourceTier;
