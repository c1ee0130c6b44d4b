//! # HTTP Server Module
//!
//! Axum API over the query gateway.
//!
//! # Endpoints
//!
//! - `POST /api/query` - answer a question
//! - `POST /api/explain` - explain a candidate without running it
//! - `GET /api/schema` - queryable collections
//! - `GET /api/test` - liveness text
//! - `GET /health` - health check
//! - `GET /observability/metrics` - counters

pub mod config;
pub mod errors;
pub mod observability_routes;
pub mod query_routes;
pub mod server;

pub use config::HttpServerConfig;
pub use errors::{ApiError, ErrorResponse};
pub use server::{build_router, HttpServer};
