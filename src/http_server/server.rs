//! # HTTP Server
//!
//! Combines the query, health and observability routers behind one CORS
//! layer.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::observability::{log_event_with_fields, Event};
use crate::pipeline::QueryGateway;

use super::config::HttpServerConfig;
use super::observability_routes::{health_routes, observability_routes, StatusState};
use super::query_routes::{query_routes, QueryState};

/// HTTP server for the ask API
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    pub fn new(config: HttpServerConfig, gateway: QueryGateway) -> Self {
        let router = build_router(&config, gateway);
        Self { config, router }
    }

    pub fn socket_addr(&self) -> io::Result<SocketAddr> {
        self.config.socket_addr().map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid listen address '{}': {}", self.config.host, e),
            )
        })
    }

    /// The assembled router, for tests
    pub fn router(self) -> Router {
        self.router
    }

    /// Binds and serves until the process stops
    pub async fn start(self) -> io::Result<()> {
        let addr = self.socket_addr()?;

        let listener = TcpListener::bind(addr).await?;
        log_event_with_fields(Event::ServerStart, &[("addr", &addr.to_string())]);

        axum::serve(listener, self.router).await?;

        log_event_with_fields(Event::ServerStopped, &[("addr", &addr.to_string())]);
        Ok(())
    }
}

/// Router with every endpoint mounted
pub fn build_router(config: &HttpServerConfig, gateway: QueryGateway) -> Router {
    let status = Arc::new(StatusState::new(
        gateway.metrics().clone(),
        gateway.audit_log().clone(),
    ));
    let state = Arc::new(QueryState::new(gateway));

    Router::new()
        .merge(health_routes(status.clone()))
        .nest("/api", query_routes(state))
        .nest("/observability", observability_routes(status))
        .layer(cors_layer(config))
}

fn cors_layer(config: &HttpServerConfig) -> CorsLayer {
    // Origins are validated when the config loads
    let origin = if config.cors_origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(config.allowed_origins().unwrap_or_default())
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{MemoryStore, QueryExecutor};
    use crate::proposal::{OllamaClient, QueryProposer};
    use crate::schema::SchemaRegistry;
    use std::time::Duration;

    fn gateway() -> QueryGateway {
        let schema = Arc::new(SchemaRegistry::builtin());
        let client = OllamaClient::new("http://127.0.0.1:1/api/generate", "llama3", Duration::from_secs(1)).unwrap();
        let proposer = QueryProposer::new(Arc::new(client), schema.clone(), Duration::from_secs(1));
        QueryGateway::new(proposer, QueryExecutor::new(Arc::new(MemoryStore::new())), schema)
    }

    #[test]
    fn test_socket_addr() {
        let server = HttpServer::new(HttpServerConfig::with_port(8080), gateway());
        assert_eq!(server.socket_addr().unwrap().to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn test_router_builds_with_origins() {
        let config = HttpServerConfig {
            cors_origins: vec!["http://localhost:3000".into()],
            ..Default::default()
        };
        let _router = HttpServer::new(config, gateway()).router();
    }
}
