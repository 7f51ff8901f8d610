//! Dynamic operation tree.
//!
//! The decoded `operations` document is held as a [`Tree`] rather than a
//! `serde_json::Value` so that uploaded files can sit inside it next to
//! ordinary JSON values.

use std::sync::Arc;

use axum::body::Bytes;
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::{Number, Value};

/// Object node: field name to child.
pub type Object = IndexMap<String, Tree>;

/// A file part received in a multipart request.
#[derive(Debug)]
pub struct Upload {
    /// Form field the part was submitted under.
    pub field: String,
    /// Client supplied file name (empty if none was given).
    pub filename: String,
    /// Declared content type of the part.
    pub content_type: Option<String>,
    /// Size in bytes.
    pub size: u64,
    /// Part content, owned until the last reference is dropped.
    pub content: Bytes,
}

impl Upload {
    pub fn new(
        field: impl Into<String>,
        filename: impl Into<String>,
        content_type: Option<String>,
        content: Bytes,
    ) -> Self {
        Self {
            field: field.into(),
            filename: filename.into(),
            content_type,
            size: content.len() as u64,
            content,
        }
    }
}

/// Shared handle to an [`Upload`].
///
/// Every location an upload is spliced into holds a clone of the same handle.
#[derive(Debug, Clone)]
pub struct FileRef(Arc<Upload>);

impl FileRef {
    pub fn new(upload: Upload) -> Self {
        Self(Arc::new(upload))
    }

    /// True if both handles point at the same uploaded part.
    pub fn same_file(&self, other: &FileRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::ops::Deref for FileRef {
    type Target = Upload;

    fn deref(&self) -> &Upload {
        &self.0
    }
}

impl PartialEq for FileRef {
    fn eq(&self, other: &Self) -> bool {
        self.same_file(other)
    }
}

/// A JSON-shaped value that may also carry file references.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Tree {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Tree>),
    Object(Object),
    File(FileRef),
}

impl Tree {
    /// Short name of the node kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Tree::Null => "null",
            Tree::Bool(_) => "boolean",
            Tree::Number(_) => "number",
            Tree::String(_) => "string",
            Tree::Array(_) => "array",
            Tree::Object(_) => "object",
            Tree::File(_) => "file",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Tree::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Tree::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileRef> {
        match self {
            Tree::File(f) => Some(f),
            _ => None,
        }
    }

    /// Decode JSON text into a tree.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice::<Value>(bytes).map(Tree::from)
    }

    /// Follow object keys and array indices from this node.
    pub fn pointer(&self, keys: &[&str]) -> Option<&Tree> {
        keys.iter().try_fold(self, |node, key| match node {
            Tree::Object(map) => map.get(*key),
            Tree::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }
}

impl From<Value> for Tree {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Tree::Null,
            Value::Bool(b) => Tree::Bool(b),
            Value::Number(n) => Tree::Number(n),
            Value::String(s) => Tree::String(s),
            Value::Array(items) => Tree::Array(items.into_iter().map(Tree::from).collect()),
            Value::Object(map) => {
                Tree::Object(map.into_iter().map(|(k, v)| (k, Tree::from(v))).collect())
            }
        }
    }
}

impl From<FileRef> for Tree {
    fn from(file: FileRef) -> Self {
        Tree::File(file)
    }
}

impl Serialize for Tree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Tree::Null => serializer.serialize_unit(),
            Tree::Bool(b) => serializer.serialize_bool(*b),
            Tree::Number(n) => n.serialize(serializer),
            Tree::String(s) => serializer.serialize_str(s),
            Tree::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Tree::Object(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
            Tree::File(file) => file.serialize(serializer),
        }
    }
}

impl Serialize for FileRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut out = serializer.serialize_map(Some(3))?;
        out.serialize_entry("filename", &self.filename)?;
        out.serialize_entry("contentType", &self.content_type)?;
        out.serialize_entry("size", &self.size)?;
        out.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn converts_from_json_value() {
        let tree = Tree::from(json!({"a": [1, "x", null, {"b": true}]}));
        assert_eq!(tree.pointer(&["a", "1"]).and_then(Tree::as_str), Some("x"));
        assert!(tree.pointer(&["a", "2"]).unwrap().is_null());
        assert_eq!(tree.pointer(&["a", "3", "b"]), Some(&Tree::Bool(true)));
    }

    #[test]
    fn file_serializes_as_description() {
        let file = FileRef::new(Upload::new(
            "0",
            "a.txt",
            Some("text/plain".into()),
            Bytes::from_static(b"hello"),
        ));
        let tree = Tree::Array(vec![Tree::File(file), Tree::Null]);
        let value = serde_json::to_value(&tree).unwrap();
        assert_eq!(
            value,
            json!([{"filename": "a.txt", "contentType": "text/plain", "size": 5}, null])
        );
    }

    #[test]
    fn file_equality_is_identity() {
        let a = FileRef::new(Upload::new("0", "a", None, Bytes::from_static(b"x")));
        let b = FileRef::new(Upload::new("0", "a", None, Bytes::from_static(b"x")));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }
}
