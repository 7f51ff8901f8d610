//! Response construction.
//!
//! # Responsibilities
//! - Encode executor results as `application/json; charset=utf-8`
//! - Map [`GatewayError`] classes to status codes and bodies
//!
//! # Design Decisions
//! - Executor results are written verbatim; errors they carry are not inspected
//! - Client errors use a short `text/plain` message, or no body at all for
//!   unsupported request shapes
//! - Disconnects produce an empty response nobody will read

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::error::{ErrorClass, GatewayError};

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Serialize `value` as the whole response body.
pub fn json_response<T: Serialize + ?Sized>(value: &T) -> Result<Response, GatewayError> {
    let body = serde_json::to_vec(value).map_err(GatewayError::Encode)?;
    let mut response = Response::new(Body::from(body));
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    Ok(response)
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match self.class() {
            ErrorClass::TransportDisconnect => {
                tracing::debug!(error = %self, "Client disconnected mid-request");
                StatusCode::BAD_REQUEST.into_response()
            }
            ErrorClass::ServerFault => {
                tracing::error!(error = %self, "Request failed");
                (self.status(), self.client_message()).into_response()
            }
            ErrorClass::ClientInput => {
                tracing::debug!(error = %self, "Rejected request");
                let message = self.client_message();
                if message.is_empty() {
                    self.status().into_response()
                } else {
                    (self.status(), message).into_response()
                }
            }
        }
    }
}
