//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (decode strategy, client address, request context)
//!     → dispatch.rs (decode, normalize, execute)
//!     → response.rs (JSON body or error status)
//!     → Send to client
//! ```

pub mod dispatch;
pub mod request;
pub mod response;
pub mod server;

pub use dispatch::graphql_handler;
pub use request::{resolve_remote_ip, DecodeStrategy};
pub use response::JSON_CONTENT_TYPE;
pub use server::GatewayServer;
