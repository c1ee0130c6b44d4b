//! Query HTTP Routes
//!
//! - `POST /query`: answer `{userQuery}` through the full pipeline
//! - `POST /explain`: explain a candidate without executing it
//! - `GET /schema`: the schema registry
//! - `GET /test`: liveness text

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::pipeline::{GatewayResponse, InspectReport, QueryGateway};
use crate::schema::SchemaRegistry;

use super::errors::ApiError;

/// State shared by query handlers
pub struct QueryState {
    pub gateway: QueryGateway,
}

impl QueryState {
    pub fn new(gateway: QueryGateway) -> Self {
        Self { gateway }
    }
}

pub fn query_routes(state: Arc<QueryState>) -> Router {
    Router::new()
        .route("/query", post(query_handler))
        .route("/explain", post(explain_handler))
        .route("/schema", get(schema_handler))
        .route("/test", get(test_handler))
        .with_state(state)
}

fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|e| ApiError::bad_request(e.body_text()))
}

async fn query_handler(
    State(state): State<Arc<QueryState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<GatewayResponse>, ApiError> {
    let body = json_body(body)?;
    let question = body
        .get("userQuery")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::bad_request("userQuery is required and must be a string"))?;

    let response = state.gateway.ask(question).await?;
    Ok(Json(response))
}

async fn explain_handler(
    State(state): State<Arc<QueryState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<InspectReport>, ApiError> {
    let candidate = json_body(body)?;
    Ok(Json(state.gateway.inspect(&candidate)))
}

async fn schema_handler(State(state): State<Arc<QueryState>>) -> Json<SchemaRegistry> {
    Json(state.gateway.schema().clone())
}

async fn test_handler() -> Json<Value> {
    Json(json!({ "status": "Backend running" }))
}
