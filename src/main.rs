// SPDX-License-Identifier: Apache-2.0

//! `governance-engine`: the operator-facing binary wiring the platform's
//! independent worker loops (consumer, scheduler, query service) and
//! one-shot admin operations onto a shared configuration and a shared pair
//! of backends.
//!
//! Each subcommand corresponds to one of the platform's independently
//! deployable processes; a real deployment runs them as separate
//! long-lived workers sharing a real KVCS and relational warehouse rather
//! than one process sharing in-memory ones.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use gov_budget::CircuitBreaker;
use gov_core::{FeatureKey, MetricBundle};
use gov_kvcs::{InMemoryKvcs, KeyValueControlStore};
use gov_pricing::{MonthlyBaseCost, PricingTable};
use gov_query::http::{self, AppState};
use gov_query::service::QueryService;
use gov_scheduler::{CollectorError, ExternalMetricsCollector, LoggingWatchdog, Watchdog};
use gov_throttle::ThrottleMode;
use gov_warehouse::{InMemoryWarehouse, RelationalWarehouse};

#[derive(Parser)]
#[command(name = "governance-engine", version, about = "Multi-tenant feature-level resource governance and observability platform")]
struct Cli {
    /// Path to a `PlatformSettings` YAML file. Falls back to built-in
    /// defaults (then `GOV_SETTING_*` environment overrides) when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Runs the telemetry queue consumer loop against a JSON batch file,
    /// standing in for the real message-queue subscription.
    Consume {
        /// Path to a JSON file containing a `TelemetryMessage` array.
        file: PathBuf,
    },
    /// Runs the cron-driven collection scheduler loop: one hourly
    /// collection cycle per tick, with midnight maintenance run once a
    /// tick crosses into a new UTC day.
    Schedule {
        /// Project ids to collect for.
        #[arg(long = "project", required = true)]
        projects: Vec<String>,
        /// Number of hourly ticks to run before exiting. Omit to run
        /// indefinitely, as a deployed worker would.
        #[arg(long)]
        ticks: Option<u32>,
    },
    /// Runs the dashboard Query Service HTTP server.
    ServeQuery {
        /// Address to bind the HTTP listener on.
        #[arg(long, default_value = "0.0.0.0:8080")]
        bind: String,
    },
    /// One-shot admin operations against the circuit breaker.
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Manually disables a feature (persists until a manual enable).
    Disable {
        /// `project:category:feature`.
        feature_key: String,
        /// Operator-supplied justification, recorded on the circuit-breaker event.
        #[arg(long, default_value = "manual admin disable")]
        reason: String,
    },
    /// Manually re-enables a feature disabled by [`AdminAction::Disable`] or a trip.
    Enable {
        /// `project:category:feature`.
        feature_key: String,
    },
}

/// A demo [`ExternalMetricsCollector`] that always accepts the credential
/// and reports zero cumulative counters. Real deployments implement this
/// trait against their own metrics/billing API; nothing in this workspace
/// talks to one.
struct NullCollector;

#[async_trait]
impl ExternalMetricsCollector for NullCollector {
    async fn validate_credential(&self, _project: &str) -> Result<(), CollectorError> {
        Ok(())
    }

    async fn pull_cumulative_counters(&self, _project: &str) -> Result<MetricBundle, CollectorError> {
        Ok(MetricBundle::new())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    gov_telemetry::init();
    let cli = Cli::parse();
    let settings = Arc::new(gov_config::load(cli.config.as_deref()).context("loading platform settings")?);

    let kvcs: Arc<dyn KeyValueControlStore> = Arc::new(InMemoryKvcs::new());
    let warehouse: Arc<dyn RelationalWarehouse> = Arc::new(InMemoryWarehouse::new());

    match cli.command {
        Commands::Consume { file } => {
            let raw = std::fs::read_to_string(&file).with_context(|| format!("reading {}", file.display()))?;
            let messages: Vec<gov_core::TelemetryMessage> =
                serde_json::from_str(&raw).with_context(|| format!("parsing {} as a telemetry batch", file.display()))?;
            let consumer = gov_consumer::TelemetryConsumer::new(kvcs.clone(), warehouse.clone(), settings.clone(), ThrottleMode::Shadow);
            let mut rng = rand::rng();
            let summary = consumer.process_batch(messages, chrono::Utc::now(), &mut rng).await;
            tracing::info!(?summary, "batch processed");
            println!("{summary:#?}");
        }
        Commands::Schedule { projects, ticks } => {
            let collector = NullCollector;
            let pricing = PricingTable::default();
            let base_cost = MonthlyBaseCost::default();
            let breaker = CircuitBreaker::new(kvcs.clone(), warehouse.clone());
            let watchdog = LoggingWatchdog;
            let mut last_day = chrono::Utc::now().date_naive();
            let mut tick = 0u32;
            loop {
                let now = chrono::Utc::now();
                let outcome = gov_scheduler::run_hourly_cycle(
                    warehouse.as_ref(),
                    kvcs.as_ref(),
                    &collector,
                    &pricing,
                    &base_cost,
                    &settings,
                    &projects,
                    now,
                )
                .await;
                watchdog.heartbeat(outcome.is_ok()).await;
                let outcome = outcome.context("hourly collection cycle")?;
                tracing::info!(?outcome, "hourly collection cycle complete");

                if now.date_naive() != last_day {
                    let touched = gov_scheduler::run_midnight_tasks(warehouse.as_ref(), kvcs.as_ref(), &breaker, &settings, now)
                        .await
                        .context("midnight maintenance")?;
                    tracing::info!(projects_touched = touched, "midnight maintenance complete");
                    last_day = now.date_naive();
                }

                tick += 1;
                if ticks.is_some_and(|limit| tick >= limit) {
                    break;
                }
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
        }
        Commands::ServeQuery { bind } => {
            let breaker = Arc::new(CircuitBreaker::new(kvcs.clone(), warehouse.clone()));
            let query_service = Arc::new(QueryService::new(warehouse.clone(), kvcs.clone(), None));
            let state = AppState::new(query_service, breaker, kvcs.clone());
            tracing::info!(%bind, "starting query service");
            http::run(&bind, state).await.context("query server exited")?;
        }
        Commands::Admin { action } => {
            let breaker = CircuitBreaker::new(kvcs.clone(), warehouse.clone());
            let now = chrono::Utc::now();
            match action {
                AdminAction::Disable { feature_key, reason } => {
                    let key = parse_feature_key(&feature_key)?;
                    breaker.manual_disable(&key, reason, now).await.context("manual disable")?;
                    tracing::info!(%feature_key, "feature manually disabled");
                }
                AdminAction::Enable { feature_key } => {
                    let key = parse_feature_key(&feature_key)?;
                    breaker.manual_enable(&key, now).await.context("manual enable")?;
                    tracing::info!(%feature_key, "feature manually enabled");
                }
            }
        }
    }

    Ok(())
}

fn parse_feature_key(raw: &str) -> anyhow::Result<FeatureKey> {
    let mut parts = raw.splitn(3, ':');
    let (Some(project), Some(category), Some(feature)) = (parts.next(), parts.next(), parts.next()) else {
        anyhow::bail!("feature key {raw:?} must be `project:category:feature`");
    };
    Ok(FeatureKey::new(project, category, feature)?)
}
