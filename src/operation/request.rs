//! Canonical operation requests handed to the executor.

use std::sync::Arc;

use axum::http::HeaderMap;
use serde::Serialize;

use super::tree::Object;

/// Per-request facts exposed to the executor.
///
/// Shared by every operation of a batch and dropped once the response is
/// written.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Client address after proxy header resolution.
    pub remote_ip: String,
    /// Inbound request headers.
    pub headers: HeaderMap,
}

/// One normalized operation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRequest {
    pub operation_name: String,
    pub query: String,
    pub variables: Object,
    #[serde(skip)]
    pub context: Arc<RequestContext>,
}
