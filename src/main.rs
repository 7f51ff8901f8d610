//! GraphQL upload gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client Request
//!   ──────────────▶ http::server ──▶ http::dispatch ──┬─▶ GET: query parameters
//!                                                     ├─▶ POST json: body
//!                                                     └─▶ POST multipart: form
//!                                                            │ operation::upload
//!                                                            │ operation::path (splice)
//!                                                            ▼
//!                                                   operation::normalize
//!                                                            │
//!                                                            ▼
//!   Client Response                                  Executor (×N, in order)
//!   ◀────────────── http::response ◀─────────────────────────┘
//! ```
//!
//! The binary serves the echo executor, which answers every operation with
//! the normalized request it received.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use graphql_upload_gateway::config::{load_config, GatewayConfig};
use graphql_upload_gateway::observability::{logging, metrics};
use graphql_upload_gateway::{EchoExecutor, GatewayServer, Shutdown};

#[derive(Parser)]
#[command(name = "graphql-upload-gateway")]
#[command(about = "GraphQL HTTP endpoint with multipart file upload support", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability);

    tracing::info!("graphql-upload-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        path = %config.listener.path,
        max_body_size = config.limits.max_body_size,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    let server = GatewayServer::new(config, EchoExecutor);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
