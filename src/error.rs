//! Request-level error taxonomy.
//!
//! Every failure while handling a request ends up as a [`GatewayError`],
//! which is sorted into one of three classes:
//!
//! ```text
//! ClientInput          → 4xx with a short message, nothing executed
//! TransportDisconnect  → client went away mid-request; absorbed silently
//! ServerFault          → 500, logged at error level
//! ```

use std::error::Error as StdError;
use std::io;

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use thiserror::Error;

use crate::operation::{NormalizeError, PathError, UploadError};

/// How a failure is surfaced to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    ClientInput,
    TransportDisconnect,
    ServerFault,
}

impl ErrorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClass::ClientInput => "client_input",
            ErrorClass::TransportDisconnect => "disconnect",
            ErrorClass::ServerFault => "server_fault",
        }
    }
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("JSON syntax error: {0}")]
    JsonSyntax(#[source] serde_json::Error),

    #[error("missing multipart field '{0}'")]
    MissingField(&'static str),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("upload path does not match operations: {0}")]
    Splice(#[from] PathError),

    #[error("failed to read multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error("invalid multipart request: {0}")]
    MultipartRejected(#[from] MultipartRejection),

    #[error("failed to read request body: {0}")]
    Body(#[from] BytesRejection),

    #[error("failed to encode response: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("method not allowed")]
    MethodNotAllowed,
}

impl GatewayError {
    pub fn class(&self) -> ErrorClass {
        match self {
            GatewayError::JsonSyntax(_)
            | GatewayError::MissingField(_)
            | GatewayError::Normalize(_)
            | GatewayError::Upload(_)
            | GatewayError::MultipartRejected(_)
            | GatewayError::MethodNotAllowed => ErrorClass::ClientInput,
            GatewayError::Multipart(e) => stream_class(e, e.status()),
            GatewayError::Body(e) => stream_class(e, e.status()),
            GatewayError::Splice(_) | GatewayError::Encode(_) => ErrorClass::ServerFault,
        }
    }

    /// Status code for the client-facing response.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            GatewayError::Multipart(e) if e.status().is_client_error() => e.status(),
            GatewayError::MultipartRejected(e) => e.status(),
            GatewayError::Body(e) if e.status().is_client_error() => e.status(),
            _ => match self.class() {
                ErrorClass::ServerFault => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::BAD_REQUEST,
            },
        }
    }

    /// Short plain-text body for client errors. Empty means no body.
    pub fn client_message(&self) -> String {
        match self {
            // a missing file part reads as a malformed upload document to clients
            GatewayError::JsonSyntax(_)
            | GatewayError::MissingField(_)
            | GatewayError::Upload(_) => "JSON syntax error".into(),
            GatewayError::Normalize(NormalizeError::MissingQuery) => "Missing query".into(),
            GatewayError::Normalize(NormalizeError::BadVariables(_)) => "Bad variables".into(),
            GatewayError::Normalize(NormalizeError::UnsupportedShape { .. }) => String::new(),
            GatewayError::Multipart(e) => e.body_text(),
            GatewayError::MultipartRejected(e) => e.body_text(),
            GatewayError::Body(e) => e.body_text(),
            GatewayError::MethodNotAllowed => "Method not allowed".into(),
            GatewayError::Splice(_) | GatewayError::Encode(_) => "Internal Server Error".into(),
        }
    }
}

fn stream_class(err: &(dyn StdError + 'static), status: StatusCode) -> ErrorClass {
    if is_disconnect(err) {
        ErrorClass::TransportDisconnect
    } else if status.is_client_error() {
        ErrorClass::ClientInput
    } else {
        ErrorClass::ServerFault
    }
}

/// True if anything in the error's source chain reports the peer going away.
pub fn is_disconnect(err: &(dyn StdError + 'static)) -> bool {
    std::iter::successors(Some(err), |&e| e.source()).any(|e| {
        let io_gone = e.downcast_ref::<io::Error>().is_some_and(|io_err| {
            matches!(
                io_err.kind(),
                io::ErrorKind::BrokenPipe
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::UnexpectedEof
            )
        });
        let hyper_gone = e.downcast_ref::<hyper::Error>().is_some_and(|hyper_err| {
            hyper_err.is_incomplete_message() || hyper_err.is_canceled() || hyper_err.is_closed()
        });
        io_gone || hyper_gone
    })
}
