//! HTTP server.
//!
//! Builds the router around a `QueryGateway` and serves it until shutdown.

use std::net::SocketAddr;

use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW,
};
use axum::http::{HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::gateway::{query_handler, QueryGateway};

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_HEADERS: &str = "Content-Type";
pub const ALLOW_METHODS: &str = "GET, POST, OPTIONS";

/// HTTP server for the query gateway.
pub struct GatewayServer {
    config: ServerConfig,
    router: Router,
}

impl GatewayServer {
    /// Create a new server for the given gateway.
    pub fn new(config: ServerConfig, gateway: QueryGateway) -> Self {
        let router = Self::build_router(gateway);
        Self { config, router }
    }

    /// Build the router.
    ///
    /// The cross-origin headers are set on every response, including 404 and
    /// 405 replies, with fixed values.
    pub fn build_router(gateway: QueryGateway) -> Router {
        Router::new()
            .route("/query", get(query_handler).options(preflight))
            .fallback(not_found)
            .with_state(gateway)
            .layer(TraceLayer::new_for_http())
            .layer(SetResponseHeaderLayer::overriding(
                ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static(ALLOW_ORIGIN),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static(ALLOW_HEADERS),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static(ALLOW_METHODS),
            ))
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> SocketAddr {
        self.config.socket_addr()
    }

    /// Bind and serve until ctrl-c.
    pub async fn start(self) -> std::io::Result<()> {
        let addr = self.socket_addr();
        let listener = TcpListener::bind(addr).await?;

        info!("Listening on http://{}", listener.local_addr()?);
        info!("Query endpoint: http://{}/query?q=<sql>", addr);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

/// `OPTIONS /query`
async fn preflight() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(ALLOW, HeaderValue::from_static("GET, HEAD, OPTIONS"))],
    )
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!("Could not install ctrl-c handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
