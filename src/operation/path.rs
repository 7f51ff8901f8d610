//! Dotted path parsing and in-place splicing.
//!
//! # Path syntax
//! ```text
//! variables.files.0.upload
//!     → [Key("variables"), Key("files"), Index(0), Key("upload")]
//! ```
//!
//! A segment made only of ASCII digits is always an array index. There is
//! no escape for object keys that look numeric; such keys cannot be
//! addressed. Upload clients rely on this convention, so it is kept as is.

use std::fmt;

use thiserror::Error;

use super::tree::Tree;

/// One step of a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

/// Failure to resolve a path against a tree.
///
/// The operations document is expected to contain the full shape with
/// placeholders at every declared upload path, so all of these indicate a
/// document that disagrees with its own upload map.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("path '{path}': expected {expected} at segment '{segment}', found {found}")]
    TypeMismatch {
        path: String,
        segment: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("path '{path}': index {index} out of range for array of length {len}")]
    IndexOutOfRange { path: String, index: usize, len: usize },

    #[error("path '{path}': missing key '{key}'")]
    MissingKey { path: String, key: String },

    #[error("path '{path}': index segment '{segment}' is too large")]
    InvalidIndex { path: String, segment: String },
}

fn is_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// Split a dotted path into typed segments.
pub fn parse_path(path: &str) -> Result<Vec<PathSegment>, PathError> {
    path.split('.')
        .map(|segment| {
            if is_index(segment) {
                segment
                    .parse::<usize>()
                    .map(PathSegment::Index)
                    .map_err(|_| PathError::InvalidIndex {
                        path: path.to_string(),
                        segment: segment.to_string(),
                    })
            } else {
                Ok(PathSegment::Key(segment.to_string()))
            }
        })
        .collect()
}

/// Write `value` into `root` at `path`, replacing whatever is there.
///
/// Every segment but the last must already exist with the right kind. The
/// last segment may add a new object field but never grows an array.
/// Splicing the same path twice overwrites the first value.
pub fn splice(root: &mut Tree, path: &str, value: Tree) -> Result<(), PathError> {
    let segments = parse_path(path)?;
    let Some((last, parents)) = segments.split_last() else {
        // split('.') always yields at least one segment
        return Ok(());
    };

    let mut cursor = root;
    for segment in parents {
        cursor = descend(cursor, segment, path)?;
    }

    match (last, cursor) {
        (PathSegment::Key(key), Tree::Object(map)) => {
            map.insert(key.clone(), value);
            Ok(())
        }
        (PathSegment::Index(index), Tree::Array(items)) => {
            let len = items.len();
            let slot = items.get_mut(*index).ok_or(PathError::IndexOutOfRange {
                path: path.to_string(),
                index: *index,
                len,
            })?;
            *slot = value;
            Ok(())
        }
        (segment, node) => Err(mismatch(path, segment, node)),
    }
}

fn descend<'a>(
    node: &'a mut Tree,
    segment: &PathSegment,
    path: &str,
) -> Result<&'a mut Tree, PathError> {
    match (segment, node) {
        (PathSegment::Key(key), Tree::Object(map)) => {
            map.get_mut(key).ok_or_else(|| PathError::MissingKey {
                path: path.to_string(),
                key: key.clone(),
            })
        }
        (PathSegment::Index(index), Tree::Array(items)) => {
            let len = items.len();
            items.get_mut(*index).ok_or(PathError::IndexOutOfRange {
                path: path.to_string(),
                index: *index,
                len,
            })
        }
        (segment, node) => Err(mismatch(path, segment, node)),
    }
}

fn mismatch(path: &str, segment: &PathSegment, node: &Tree) -> PathError {
    PathError::TypeMismatch {
        path: path.to_string(),
        segment: segment.to_string(),
        expected: match segment {
            PathSegment::Key(_) => "object",
            PathSegment::Index(_) => "array",
        },
        found: node.kind(),
    }
}
