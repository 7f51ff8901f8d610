//! Execution backend seam.
//!
//! The gateway never interprets results: whatever the executor returns is
//! written back as the response body, errors included.

use std::future::Future;

use serde_json::{json, Value};

use crate::operation::OperationRequest;

/// Runs one normalized operation.
///
/// Called once per operation. Batches are executed one element at a time,
/// in order, so an implementation never sees concurrent calls from a single
/// HTTP request.
pub trait Executor: Send + Sync + 'static {
    fn execute(&self, request: OperationRequest) -> impl Future<Output = Value> + Send;
}

impl<F, Fut> Executor for F
where
    F: Fn(OperationRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Value> + Send,
{
    fn execute(&self, request: OperationRequest) -> impl Future<Output = Value> + Send {
        self(request)
    }
}

/// Executor that answers with the operation it received.
///
/// Uploaded files show up as `{filename, contentType, size}` objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoExecutor;

impl Executor for EchoExecutor {
    async fn execute(&self, request: OperationRequest) -> Value {
        match serde_json::to_value(&request) {
            Ok(operation) => json!({
                "data": {
                    "operation": operation,
                    "remoteIp": request.context.remote_ip,
                }
            }),
            Err(e) => json!({ "errors": [{ "message": e.to_string() }] }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{Object, RequestContext, Tree};
    use std::sync::Arc;

    #[tokio::test]
    async fn echo_reflects_operation() {
        let mut variables = Object::new();
        variables.insert("id".into(), Tree::String("7".into()));
        let request = OperationRequest {
            operation_name: "Q".into(),
            query: "query Q { a }".into(),
            variables,
            context: Arc::new(RequestContext {
                remote_ip: "10.0.0.1".into(),
                ..Default::default()
            }),
        };
        let result = EchoExecutor.execute(request).await;
        assert_eq!(
            result,
            json!({"data": {
                "operation": {
                    "operationName": "Q",
                    "query": "query Q { a }",
                    "variables": {"id": "7"}
                },
                "remoteIp": "10.0.0.1"
            }})
        );
    }

    #[tokio::test]
    async fn closures_are_executors() {
        let exec = |req: OperationRequest| async move { json!({ "query": req.query }) };
        let request = OperationRequest {
            operation_name: String::new(),
            query: "{ a }".into(),
            variables: Object::new(),
            context: Arc::default(),
        };
        assert_eq!(exec.execute(request).await, json!({"query": "{ a }"}));
    }
}
