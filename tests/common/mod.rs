//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use graphql_upload_gateway::{Executor, GatewayConfig, GatewayServer, Shutdown};
use tokio::net::TcpListener;

/// Running gateway bound to an ephemeral local port.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

impl TestGateway {
    pub fn url(&self) -> String {
        format!("http://{}/graphql", self.addr)
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a gateway serving `executor` with default configuration.
pub async fn start_gateway<E: Executor>(executor: E) -> TestGateway {
    start_gateway_with(GatewayConfig::default(), executor).await
}

pub async fn start_gateway_with<E: Executor>(config: GatewayConfig, executor: E) -> TestGateway {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = GatewayServer::new(config, executor);
    let rx = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestGateway { addr, shutdown }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
