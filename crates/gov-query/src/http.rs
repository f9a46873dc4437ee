// SPDX-License-Identifier: Apache-2.0

//! The Query Service's HTTP surface: dashboard range queries, hot-path
//! feature status, and circuit-breaker admin endpoints.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use gov_budget::CircuitBreaker;
use gov_core::FeatureKey;
use gov_kvcs::{keys, KeyValueControlStore, KvcsJsonExt};
use gov_throttle::PIDState;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::error::QueryError;
use crate::service::QueryService;

/// Shared state for the query HTTP server.
#[derive(Clone)]
pub struct AppState {
    query_service: Arc<QueryService>,
    breaker: Arc<CircuitBreaker>,
    kvcs: Arc<dyn KeyValueControlStore>,
}

impl AppState {
    /// Builds the shared HTTP state from the service's collaborators.
    #[must_use]
    pub fn new(query_service: Arc<QueryService>, breaker: Arc<CircuitBreaker>, kvcs: Arc<dyn KeyValueControlStore>) -> Self {
        Self {
            query_service,
            breaker,
            kvcs,
        }
    }
}

/// Errors that can occur standing up the HTTP listener.
#[derive(thiserror::Error, Debug)]
pub enum ServeError {
    /// The configured bind address could not be parsed.
    #[error("invalid bind address {addr:?}: {details}")]
    InvalidBindAddress {
        /// The address string that failed to parse.
        addr: String,
        /// Parse failure detail.
        details: String,
    },
    /// The TCP listener could not be bound.
    #[error("failed to bind query server on {addr}: {details}")]
    BindFailed {
        /// The address that failed to bind.
        addr: String,
        /// Bind failure detail.
        details: String,
    },
    /// The server encountered a fatal error while serving.
    #[error("query server error: {0}")]
    ServerError(String),
}

/// Builds the query service's router.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/query", get(query))
        .route("/status/{feature_key}", get(feature_status))
        .route("/admin/{feature_key}/disable", post(disable))
        .route("/admin/{feature_key}/enable", post(enable))
        .route("/livez", get(livez))
        .with_state(state)
}

/// Runs the query HTTP server on `bind_address` until the process is killed.
pub async fn run(bind_address: &str, state: AppState) -> Result<(), ServeError> {
    let addr: SocketAddr = bind_address.parse().map_err(|e| ServeError::InvalidBindAddress {
        addr: bind_address.to_string(),
        details: format!("{e}"),
    })?;
    let listener = TcpListener::bind(addr).await.map_err(|e| ServeError::BindFailed {
        addr: addr.to_string(),
        details: format!("{e}"),
    })?;
    tracing::info!(%addr, "query service listening");
    axum::serve(listener, router(state))
        .await
        .map_err(|e| ServeError::ServerError(format!("{e}")))
}

#[derive(Debug, Deserialize)]
struct QueryParams {
    project: String,
    start: String,
    end: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QuerySuccess {
    success: bool,
    data: Vec<gov_warehouse::model::DailyRollup>,
    source: crate::tiers::SourceTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    success: bool,
    error: &'static str,
    code: &'static str,
    message: String,
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        let status = if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let body = ErrorBody {
            success: false,
            error: if self.is_client_error() { "bad_request" } else { "internal_error" },
            code: self.code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

async fn query(State(state): State<AppState>, Query(params): Query<QueryParams>) -> Result<Json<QuerySuccess>, QueryError> {
    let result = state
        .query_service
        .query_range(&params.project, &params.start, &params.end, Utc::now())
        .await?;
    Ok(Json(QuerySuccess {
        success: true,
        data: result.rows,
        source: result.tier,
        note: result.note,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FeatureStatusResponse {
    feature_key: String,
    status: &'static str,
    throttle_rate: f64,
}

async fn feature_status(State(state): State<AppState>, Path(feature_key): Path<String>) -> Result<Json<FeatureStatusResponse>, QueryError> {
    let key = parse_feature_key(&feature_key)?;
    let status = state.breaker.status(&key).await?;
    let pid = state.kvcs.get_json::<PIDState>(&keys::pid(&key)).await?.unwrap_or_default();
    Ok(Json(FeatureStatusResponse {
        feature_key: key.to_string(),
        status: if status == gov_budget::CircuitBreakerStatus::Stop { "STOP" } else { "GO" },
        throttle_rate: pid.throttle_rate,
    }))
}

#[derive(Debug, Deserialize)]
struct DisableRequest {
    reason: String,
}

async fn disable(
    State(state): State<AppState>,
    Path(feature_key): Path<String>,
    Json(body): Json<DisableRequest>,
) -> Result<StatusCode, QueryError> {
    let key = parse_feature_key(&feature_key)?;
    state.breaker.manual_disable(&key, body.reason, Utc::now()).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn enable(State(state): State<AppState>, Path(feature_key): Path<String>) -> Result<StatusCode, QueryError> {
    let key = parse_feature_key(&feature_key)?;
    state.breaker.manual_enable(&key, Utc::now()).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn livez() -> StatusCode {
    StatusCode::OK
}

fn parse_feature_key(raw: &str) -> Result<FeatureKey, QueryError> {
    raw.parse().map_err(QueryError::InvalidFeatureKey)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_well_formed_feature_key() {
        assert!(parse_feature_key("acme:checkout:stripe-charge").is_ok());
    }

    #[test]
    fn rejects_a_malformed_feature_key() {
        assert!(parse_feature_key("acme-checkout").is_err());
    }
}
