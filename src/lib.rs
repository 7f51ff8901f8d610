//! GraphQL HTTP transport with multipart file uploads.
//!
//! Decodes GET, JSON (single or batched) and multipart upload requests into
//! [`OperationRequest`]s, runs each through an [`Executor`] and writes the
//! results back as JSON.

pub mod config;
pub mod error;
pub mod executor;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod operation;

pub use config::GatewayConfig;
pub use error::{ErrorClass, GatewayError};
pub use executor::{EchoExecutor, Executor};
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
pub use operation::{OperationRequest, RequestContext, Tree};
