// SPDX-License-Identifier: Apache-2.0

//! Errors raised by the Collection Scheduler.

use miette::Diagnostic;

use crate::collector::CollectorError;

/// Errors raised while running a scheduler cycle.
#[derive(thiserror::Error, Diagnostic, Debug)]
pub enum SchedulerError {
    /// The warehouse backend failed.
    #[error("warehouse error: {0}")]
    Warehouse(#[from] gov_warehouse::WarehouseError),
    /// The KVCS backend failed.
    #[error("kvcs error: {0}")]
    Kvcs(#[from] gov_kvcs::KvcsError),
    /// The shared circuit breaker failed.
    #[error("budget error: {0}")]
    Budget(#[from] gov_budget::BudgetError),
    /// The rollup engine failed.
    #[error("rollup error: {0}")]
    Rollup(#[from] gov_rollup::RollupError),
    /// The external collector rejected the configured credential.
    #[error("external credential validation failed for project {project}: {source}")]
    CredentialInvalid {
        /// Project whose credential failed validation.
        project: String,
        /// Underlying collector error.
        source: CollectorError,
    },
    /// Every retry attempt at pulling external counters failed.
    #[error("external metrics pull for project {project} failed after {attempts} attempts: {source}")]
    CollectionFailed {
        /// Project the pull was attempted for.
        project: String,
        /// Number of attempts made, including the first.
        attempts: u32,
        /// The last underlying collector error.
        source: CollectorError,
    },
}
