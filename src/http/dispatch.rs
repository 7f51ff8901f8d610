//! Request dispatch.
//!
//! # State Machine
//! ```text
//! Receive → SelectDecodeStrategy
//!     Get        → query parameters
//!     JsonBody   → one JSON value from the body
//!     Multipart  → form → collect uploads → splice into `operations`
//!     NoBody     → nothing decoded
//! → Normalize → Execute (once per operation, sequential) → Serialize
//! ```
//!
//! A decode or normalize failure ends the request before any operation is
//! executed.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::body::{Body, Bytes};
use axum::extract::{FromRequest, Multipart, Query, State};
use axum::http::{Request, Uri};
use axum::response::{IntoResponse, Response};

use crate::error::GatewayError;
use crate::executor::Executor;
use crate::http::request::DecodeStrategy;
use crate::http::response::json_response;
use crate::observability::metrics;
use crate::operation::{
    collect, from_query_params, normalize, splice_uploads, MultipartForm, Operations,
    RequestContext, Tree,
};

/// Axum handler for the GraphQL endpoint.
pub async fn graphql_handler<E: Executor>(
    State(executor): State<Arc<E>>,
    request: Request<Body>,
) -> Response {
    let start_time = Instant::now();
    let strategy = DecodeStrategy::select(request.method(), request.headers());

    tracing::debug!(
        method = %request.method(),
        strategy = strategy.as_str(),
        "Dispatching request"
    );

    let response = match dispatch(executor.as_ref(), strategy, request).await {
        Ok(response) => response,
        Err(e) => {
            metrics::record_error(e.class().as_str());
            e.into_response()
        }
    };

    metrics::record_request(strategy.as_str(), response.status().as_u16(), start_time);
    response
}

/// Decode, normalize and execute one inbound request.
pub async fn dispatch<E: Executor>(
    executor: &E,
    strategy: DecodeStrategy,
    request: Request<Body>,
) -> Result<Response, GatewayError> {
    let context = Arc::new(RequestContext::from_request(&request));

    let operations = match strategy {
        DecodeStrategy::Get => {
            Operations::Single(from_query_params(&query_params(request.uri()))?)
        }
        DecodeStrategy::JsonBody => normalize(decode_json_body(request).await?)?,
        DecodeStrategy::Multipart => normalize(Some(decode_multipart(request).await?))?,
        DecodeStrategy::NoBody => normalize(None)?,
        DecodeStrategy::Unsupported => return Err(GatewayError::MethodNotAllowed),
    };

    metrics::record_operations(operations.len());

    match operations {
        Operations::Single(draft) => {
            let result = executor.execute(draft.bind(context)).await;
            json_response(&result)
        }
        Operations::Batch(drafts) => {
            tracing::debug!(batch_size = drafts.len(), "Executing batch");
            let mut results = Vec::with_capacity(drafts.len());
            for draft in drafts {
                results.push(executor.execute(draft.bind(Arc::clone(&context))).await);
            }
            json_response(&results)
        }
    }
}

/// Decode the query string. A repeated parameter keeps its first value;
/// an undecodable query string yields no parameters.
fn query_params(uri: &Uri) -> HashMap<String, String> {
    let pairs = match Query::<Vec<(String, String)>>::try_from_uri(uri) {
        Ok(Query(pairs)) => pairs,
        Err(e) => {
            tracing::debug!(error = %e, "Undecodable query string");
            return HashMap::new();
        }
    };
    let mut params = HashMap::with_capacity(pairs.len());
    for (name, value) in pairs {
        params.entry(name).or_insert(value);
    }
    params
}

/// Read the body as a single JSON value. An empty body decodes to nothing.
async fn decode_json_body(request: Request<Body>) -> Result<Option<Tree>, GatewayError> {
    let body = Bytes::from_request(request, &()).await?;
    if body.is_empty() {
        return Ok(None);
    }
    Tree::from_json_slice(&body)
        .map(Some)
        .map_err(GatewayError::JsonSyntax)
}

/// Read a multipart upload request and splice its files into `operations`.
async fn decode_multipart(request: Request<Body>) -> Result<Tree, GatewayError> {
    let mut multipart = Multipart::from_request(request, &()).await?;
    let form = MultipartForm::read(&mut multipart).await?;

    let map = form.value("map").ok_or(GatewayError::MissingField("map"))?;
    let uploads = collect(&form, map)?;

    let raw_operations = form
        .value("operations")
        .ok_or(GatewayError::MissingField("operations"))?;
    let mut operations =
        Tree::from_json_slice(raw_operations.as_bytes()).map_err(GatewayError::JsonSyntax)?;

    splice_uploads(&mut operations, &uploads)?;

    let file_count: usize = uploads.iter().map(|(_, paths)| paths.len()).sum();
    metrics::record_uploads(uploads.len());
    tracing::debug!(files = uploads.len(), placements = file_count, "Uploads spliced");

    Ok(operations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorClass;
    use crate::operation::OperationRequest;
    use axum::http::header;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::io;

    fn record_query(req: OperationRequest) -> impl std::future::Future<Output = Value> + Send {
        async move { json!({ "query": req.query, "name": req.operation_name }) }
    }

    #[test]
    fn repeated_query_params_keep_first() {
        let uri: Uri = "/graphql?query=first&query=second&operationName=A".parse().unwrap();
        let params = query_params(&uri);
        assert_eq!(params["query"], "first");
        assert_eq!(params["operationName"], "A");
    }

    #[tokio::test]
    async fn get_uses_first_query_value() {
        let request = Request::get("/graphql?query=%7B%20a%20%7D&query=%7B%20b%20%7D")
            .body(Body::empty())
            .unwrap();
        let response = dispatch(&record_query, DecodeStrategy::Get, request).await.unwrap();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, json!({ "query": "{ a }", "name": "" }));
    }

    #[tokio::test]
    async fn multipart_disconnect_is_absorbed() {
        let partial = concat!(
            "--BOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"operations\"\r\n\r\n",
            "{\"query\": \"q\", \"vari",
        );
        let chunks: Vec<Result<&'static [u8], io::Error>> = vec![
            Ok(partial.as_bytes()),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "peer reset")),
        ];
        let request = Request::post("/graphql")
            .header(header::CONTENT_TYPE, "multipart/form-data; boundary=BOUNDARY")
            .body(Body::from_stream(futures_util::stream::iter(chunks)))
            .unwrap();

        let err = dispatch(&record_query, DecodeStrategy::Multipart, request)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Multipart(_)), "{err:?}");
        assert_eq!(err.class(), ErrorClass::TransportDisconnect);
    }

    #[tokio::test]
    async fn multipart_truncated_body_is_absorbed() {
        let chunks: Vec<Result<&'static [u8], io::Error>> = vec![
            Ok(b"--BOUNDARY\r\nContent-Disposition: form-data; name=\"map\"\r\n\r\n{"),
            Err(io::Error::new(io::ErrorKind::UnexpectedEof, "eof")),
        ];
        let request = Request::post("/graphql")
            .header(header::CONTENT_TYPE, "multipart/form-data; boundary=BOUNDARY")
            .body(Body::from_stream(futures_util::stream::iter(chunks)))
            .unwrap();

        let err = dispatch(&record_query, DecodeStrategy::Multipart, request)
            .await
            .unwrap_err();
        assert_eq!(err.class(), ErrorClass::TransportDisconnect);
    }
}
