//! Operation preparation subsystem.
//!
//! # Data Flow
//! ```text
//! decoded body / query string / multipart form
//!     → tree.rs (JSON document that can also hold files)
//!     → upload.rs (collect file parts named by the `map` field)
//!     → path.rs (splice each file into the document)
//!     → normalize.rs (document → one operation or a batch)
//!     → request.rs (operation bound to its request context)
//! ```
//!
//! Everything here is pure in-memory transformation; no I/O happens past
//! reading the multipart stream.

pub mod normalize;
pub mod path;
pub mod request;
pub mod tree;
pub mod upload;

pub use normalize::{from_query_params, normalize, NormalizeError, OperationDraft, Operations};
pub use path::{parse_path, splice, PathError, PathSegment};
pub use request::{OperationRequest, RequestContext};
pub use tree::{FileRef, Object, Tree, Upload};
pub use upload::{collect, splice_uploads, MultipartForm, UploadError, UploadMap};
