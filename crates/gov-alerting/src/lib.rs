// SPDX-License-Identifier: Apache-2.0

//! Error classification, fingerprinting, and the P0/P1/P2 Error Alerter.

pub mod alerter;
pub mod classify;
pub mod dedup;
pub mod delivery;
pub mod digest;
pub mod error;
pub mod escalation;
pub mod fingerprint;

pub use alerter::ErrorAlerter;
pub use classify::{classify, extract_code, RawError};
pub use delivery::{deliver_with_retry, AlertPayload, AlertSink, LoggingSink};
pub use digest::{daily_summary, hourly_digest, DailySummary, DigestEntry};
pub use error::AlertingError;
pub use escalation::decide_priority;
pub use fingerprint::fingerprint;
