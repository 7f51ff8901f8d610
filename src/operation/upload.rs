//! Upload collection for multipart requests.
//!
//! # Data Flow
//! ```text
//! multipart body
//!     → MultipartForm::read (text fields + file parts, by field name)
//!     → collect (decode `map`, resolve each field to its file part)
//!     → splice_uploads (write each file at each of its paths)
//! ```

use std::collections::HashMap;

use axum::extract::multipart::{Multipart, MultipartError};
use indexmap::IndexMap;
use thiserror::Error;

use super::path::{splice, PathError};
use super::tree::{FileRef, Tree, Upload};

/// Raw `map` field: file field name to destination paths, in declared order.
pub type UploadMap = IndexMap<String, Vec<String>>;

/// Errors produced while collecting uploads.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("invalid JSON in 'map' field: {0}")]
    MalformedMap(#[source] serde_json::Error),

    #[error("missing file part: {0}")]
    MissingFilePart(String),
}

/// Decoded multipart form.
#[derive(Debug, Default)]
pub struct MultipartForm {
    values: HashMap<String, String>,
    files: HashMap<String, FileRef>,
}

impl MultipartForm {
    /// Drain a multipart stream into memory.
    ///
    /// Parts with a file name are file parts; everything else is a text
    /// value. When a field name repeats, the first occurrence wins.
    pub async fn read(multipart: &mut Multipart) -> Result<Self, MultipartError> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(filename) => {
                    let content_type = field.content_type().map(str::to_string);
                    let content = field.bytes().await?;
                    tracing::trace!(
                        field = %name,
                        filename = %filename,
                        size = content.len(),
                        "File part received"
                    );
                    form.files.entry(name.clone()).or_insert_with(|| {
                        FileRef::new(Upload::new(name, filename, content_type, content))
                    });
                }
                None => {
                    let text = field.text().await?;
                    form.values.entry(name).or_insert(text);
                }
            }
        }
        Ok(form)
    }

    /// Text value of a non-file field.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// File part submitted under `name`.
    pub fn file(&self, name: &str) -> Option<&FileRef> {
        self.files.get(name)
    }

    pub fn insert_value(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn insert_file(&mut self, upload: Upload) -> FileRef {
        let file = FileRef::new(upload);
        self.files.insert(file.field.clone(), file.clone());
        file
    }
}

/// Resolve the upload map against the form's file parts.
///
/// Every declared path is kept, including duplicates, in declared order.
pub fn collect(
    form: &MultipartForm,
    map_json: &str,
) -> Result<Vec<(FileRef, Vec<String>)>, UploadError> {
    let map: UploadMap = serde_json::from_str(map_json).map_err(UploadError::MalformedMap)?;
    map.into_iter()
        .map(|(field, paths)| {
            form.file(&field)
                .cloned()
                .map(|file| (file, paths))
                .ok_or(UploadError::MissingFilePart(field))
        })
        .collect()
}

/// Write every collected upload into `operations` at each of its paths.
pub fn splice_uploads(
    operations: &mut Tree,
    uploads: &[(FileRef, Vec<String>)],
) -> Result<(), PathError> {
    for (file, paths) in uploads {
        for path in paths {
            splice(operations, path, Tree::File(file.clone()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use serde_json::json;

    fn form_with(fields: &[&str]) -> MultipartForm {
        let mut form = MultipartForm::default();
        for field in fields {
            let content = Bytes::from_static(b"data");
            form.insert_file(Upload::new(*field, format!("{field}.txt"), None, content));
        }
        form
    }

    #[test]
    fn collects_in_declared_order() {
        let form = form_with(&["1", "0"]);
        let map = r#"{"1": ["variables.b"], "0": ["variables.a", "variables.a"]}"#;
        let uploads = collect(&form, map).unwrap();
        assert_eq!(uploads.len(), 2);
        assert_eq!(uploads[0].0.field, "1");
        assert_eq!(uploads[1].0.field, "0");
        assert_eq!(uploads[1].1, vec!["variables.a", "variables.a"]);
    }

    #[test]
    fn malformed_map_is_rejected() {
        let form = form_with(&["0"]);
        assert!(matches!(collect(&form, "{nope"), Err(UploadError::MalformedMap(_))));
        assert!(matches!(
            collect(&form, r#"{"0": "variables.a"}"#),
            Err(UploadError::MalformedMap(_))
        ));
    }

    #[test]
    fn missing_file_part_is_rejected() {
        let form = form_with(&["0"]);
        let err = collect(&form, r#"{"0": ["a"], "1": ["b"]}"#).unwrap_err();
        assert!(matches!(err, UploadError::MissingFilePart(ref f) if f == "1"));
    }

    #[test]
    fn text_field_does_not_count_as_file() {
        let mut form = MultipartForm::default();
        form.insert_value("0", "not a file");
        assert!(matches!(collect(&form, r#"{"0": ["a"]}"#), Err(UploadError::MissingFilePart(_))));
    }

    #[test]
    fn fans_out_one_file_to_many_paths() {
        let form = form_with(&["0"]);
        let mut operations = Tree::from(json!({
            "query": "mutation($a: Upload, $b: [Upload]) { x }",
            "variables": {"a": null, "b": [null, null]}
        }));
        let uploads = collect(&form, r#"{"0": ["variables.a", "variables.b.1"]}"#).unwrap();
        splice_uploads(&mut operations, &uploads).unwrap();

        let a = operations.pointer(&["variables", "a"]).and_then(Tree::as_file).unwrap();
        let b1 = operations.pointer(&["variables", "b", "1"]).and_then(Tree::as_file).unwrap();
        assert!(a.same_file(b1));
        assert!(operations.pointer(&["variables", "b", "0"]).unwrap().is_null());
    }

    #[test]
    fn splice_failure_surfaces() {
        let form = form_with(&["0"]);
        let mut operations = Tree::from(json!({"variables": {}}));
        let uploads = collect(&form, r#"{"0": ["variables.list.0"]}"#).unwrap();
        assert!(splice_uploads(&mut operations, &uploads).is_err());
    }
}
