// SPDX-License-Identifier: Apache-2.0

//! External dead-man's-switch heartbeat.

use async_trait::async_trait;

/// External watchdog the scheduler pings once per cycle.
///
/// `success = false` signals a collection failure so an external paging
/// system can alert on a missed or broken cycle, distinct from the
/// scheduler simply not running at all.
#[async_trait]
pub trait Watchdog: Send + Sync {
    /// Reports this cycle's outcome.
    async fn heartbeat(&self, success: bool);
}

/// A watchdog that only logs; used where no external dead-man's-switch is wired up.
pub struct LoggingWatchdog;

#[async_trait]
impl Watchdog for LoggingWatchdog {
    async fn heartbeat(&self, success: bool) {
        if success {
            tracing::debug!("scheduler heartbeat: ok");
        } else {
            tracing::error!("scheduler heartbeat: collection cycle failed");
        }
    }
}
