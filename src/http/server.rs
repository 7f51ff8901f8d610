//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the GraphQL endpoint
//! - Wire up middleware (tracing, body limits, request ID)
//! - Bind server to listener and serve until shutdown

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::any;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::executor::Executor;
use crate::http::dispatch::graphql_handler;

/// HTTP server exposing one GraphQL endpoint backed by an [`Executor`].
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
}

impl GatewayServer {
    /// Create a new server for `executor` with the given configuration.
    pub fn new<E: Executor>(config: GatewayConfig, executor: E) -> Self {
        let router = Self::build_router(&config, Arc::new(executor));
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router<E: Executor>(config: &GatewayConfig, executor: Arc<E>) -> Router {
        let max_body_size = config.limits.max_body_size;
        Router::new()
            .route(&config.listener.path, any(graphql_handler::<E>))
            .with_state(executor)
            .layer(DefaultBodyLimit::max(max_body_size))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// Router with all layers applied, for embedding or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// the shutdown channel fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            path = %self.config.listener.path,
            max_body_size = self.config.limits.max_body_size,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
