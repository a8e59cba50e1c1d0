//! Direct-to-storage file uploads.
//!
//! Each file goes through its own presign + transfer pair. Multi-file
//! uploads run strictly in order and stop at the first failure; see
//! [`sequence::run_sequence`].

pub mod sequence;
pub mod transfer;

pub use sequence::{run_sequence, CompletedUpload, UploadFailure, UploadFile, UploadReport};
pub use transfer::{resolve_upload_url, Uploader};
