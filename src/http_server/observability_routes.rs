//! Health and counters
//!
//! - `GET /health` (root and `/observability/health`)
//! - `GET /observability/metrics`
//! - `GET /observability/audit?limit=N` (newest retained decisions)

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::observability::{AuditLog, AuditRecord, MetricsRegistry, MetricsSnapshot};

const DEFAULT_AUDIT_LIMIT: usize = 50;
const MAX_AUDIT_LIMIT: usize = 500;

/// Shared by the health, metrics and audit handlers
pub struct StatusState {
    metrics: Arc<MetricsRegistry>,
    audit: Arc<dyn AuditLog>,
    started: Instant,
}

impl StatusState {
    pub fn new(metrics: Arc<MetricsRegistry>, audit: Arc<dyn AuditLog>) -> Self {
        Self {
            metrics,
            audit,
            started: Instant::now(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub uptime_secs: u64,
    #[serde(flatten)]
    pub counters: MetricsSnapshot,
}

#[derive(Debug, Deserialize)]
pub struct AuditParams {
    pub limit: Option<usize>,
}

impl AuditParams {
    fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_AUDIT_LIMIT).min(MAX_AUDIT_LIMIT)
    }
}

#[derive(Debug, Serialize)]
pub struct AuditResponse {
    pub count: usize,
    pub records: Vec<AuditRecord>,
}

pub fn observability_routes(state: Arc<StatusState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/audit", get(audit_handler))
        .with_state(state)
}

pub fn health_routes(state: Arc<StatusState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(state)
}

async fn health_handler(State(state): State<Arc<StatusState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.started.elapsed().as_secs(),
    })
}

async fn metrics_handler(State(state): State<Arc<StatusState>>) -> Json<MetricsResponse> {
    Json(MetricsResponse {
        uptime_secs: state.started.elapsed().as_secs(),
        counters: state.metrics.snapshot(),
    })
}

async fn audit_handler(
    State(state): State<Arc<StatusState>>,
    Query(params): Query<AuditParams>,
) -> Json<AuditResponse> {
    let records = state.audit.recent(params.effective_limit());
    Json(AuditResponse {
        count: records.len(),
        records,
    })
}
