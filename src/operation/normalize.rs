//! Operation normalization.
//!
//! Turns a decoded request document into canonical operations:
//! - object → one operation
//! - array of objects → a batch, order preserved
//! - anything else → [`NormalizeError::UnsupportedShape`]
//!
//! GET requests have no document; [`from_query_params`] reads the same
//! fields from the query string instead.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use super::request::{OperationRequest, RequestContext};
use super::tree::{Object, Tree};

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("unsupported request shape: {found}")]
    UnsupportedShape { found: &'static str },

    #[error("Missing query")]
    MissingQuery,

    #[error("Bad variables: {0}")]
    BadVariables(String),
}

/// Operation fields before they are bound to a request context.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OperationDraft {
    pub operation_name: String,
    pub query: String,
    pub variables: Object,
}

impl OperationDraft {
    /// Extract the operation fields from an object node.
    ///
    /// Fields of the wrong type fall back to their defaults.
    fn from_object(mut object: Object) -> Self {
        let mut take_string = |key: &str| match object.swap_remove(key) {
            Some(Tree::String(s)) => s,
            _ => String::new(),
        };
        let operation_name = take_string("operationName");
        let query = take_string("query");
        let variables = match object.swap_remove("variables") {
            Some(Tree::Object(vars)) => vars,
            _ => Object::new(),
        };
        Self { operation_name, query, variables }
    }

    pub fn bind(self, context: Arc<RequestContext>) -> OperationRequest {
        OperationRequest {
            operation_name: self.operation_name,
            query: self.query,
            variables: self.variables,
            context,
        }
    }
}

/// Result of normalization: one operation or an ordered batch.
#[derive(Debug, Clone, PartialEq)]
pub enum Operations {
    Single(OperationDraft),
    Batch(Vec<OperationDraft>),
}

impl Operations {
    pub fn len(&self) -> usize {
        match self {
            Operations::Single(_) => 1,
            Operations::Batch(ops) => ops.len(),
        }
    }
}

/// Normalize a decoded document. `None` means the request carried no body.
pub fn normalize(decoded: Option<Tree>) -> Result<Operations, NormalizeError> {
    match decoded {
        Some(Tree::Object(object)) => Ok(Operations::Single(OperationDraft::from_object(object))),
        Some(Tree::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Tree::Object(object) => Ok(OperationDraft::from_object(object)),
                other => Err(NormalizeError::UnsupportedShape { found: other.kind() }),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Operations::Batch),
        Some(other) => Err(NormalizeError::UnsupportedShape { found: other.kind() }),
        None => Err(NormalizeError::UnsupportedShape { found: "empty body" }),
    }
}

/// Build an operation from GET query parameters.
pub fn from_query_params(
    params: &HashMap<String, String>,
) -> Result<OperationDraft, NormalizeError> {
    let query = match params.get("query") {
        Some(q) if !q.is_empty() => q.clone(),
        _ => return Err(NormalizeError::MissingQuery),
    };

    let variables = match params.get("variables").map(String::as_str) {
        None | Some("") => Object::new(),
        Some(raw) => match Tree::from_json_slice(raw.as_bytes()) {
            Ok(Tree::Object(vars)) => vars,
            Ok(Tree::Null) => Object::new(),
            Ok(other) => {
                let found = other.kind();
                return Err(NormalizeError::BadVariables(format!(
                    "expected object, found {found}"
                )));
            }
            Err(e) => return Err(NormalizeError::BadVariables(e.to_string())),
        },
    };

    let operation_name = params.get("operationName").cloned().unwrap_or_default();

    Ok(OperationDraft { operation_name, query, variables })
}
