// SPDX-License-Identifier: Apache-2.0

//! Errors raised by the Query Service.

use miette::Diagnostic;

/// Errors raised while serving a dashboard query or admin request.
///
/// Analytics-engine failures are deliberately *not* a variant here: the
/// multi-tier read path treats them as a fall-through to the warehouse
/// tier rather than a request failure.
#[derive(thiserror::Error, Diagnostic, Debug)]
pub enum QueryError {
    /// The warehouse backend failed.
    #[error("warehouse error: {0}")]
    Warehouse(#[from] gov_warehouse::WarehouseError),
    /// The KVCS backend failed.
    #[error("kvcs error: {0}")]
    Kvcs(#[from] gov_kvcs::KvcsError),
    /// The circuit breaker backend failed.
    #[error("budget error: {0}")]
    Budget(#[from] gov_budget::BudgetError),
    /// The requested date range was malformed (start after end, etc).
    #[error("invalid query range: {0}")]
    InvalidRange(String),
    /// The requested feature key was malformed.
    #[error("invalid feature key: {0}")]
    InvalidFeatureKey(#[from] gov_core::CoreError),
}

impl QueryError {
    /// A stable machine-readable code for the `{success:false, error, code,
    /// message}` envelope.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::Warehouse(_) => "warehouse_unavailable",
            QueryError::Kvcs(_) => "kvcs_unavailable",
            QueryError::Budget(_) => "budget_backend_unavailable",
            QueryError::InvalidRange(_) => "invalid_range",
            QueryError::InvalidFeatureKey(_) => "invalid_feature_key",
        }
    }

    /// True if this is a client input error (HTTP 4xx) rather than a
    /// backend failure (HTTP 5xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, QueryError::InvalidRange(_) | QueryError::InvalidFeatureKey(_))
    }
}
