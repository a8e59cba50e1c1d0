use std::future::Future;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::api::{ApiError, Result};

/// Fallback content type when the extension says nothing.
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// A local file queued for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub path: PathBuf,
    pub original_name: String,
    pub content_type: String,
}

impl UploadFile {
    /// Derive name and content type from the path.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let original_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                ApiError::validation(format!("{} is not a file path", path.display()))
            })?;
        let content_type = mime_guess::from_path(path)
            .first()
            .map(|mime| mime.essence_str().to_string())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        Ok(Self {
            path: path.to_path_buf(),
            original_name,
            content_type,
        })
    }
}

#[derive(Debug)]
pub struct CompletedUpload<T> {
    pub file: UploadFile,
    pub output: T,
}

/// The file that stopped a sequence.
#[derive(Debug)]
pub struct UploadFailure {
    /// Position of the file in the original input.
    pub index: usize,
    pub file: UploadFile,
    pub error: ApiError,
}

/// Outcome of a multi-file upload.
///
/// `completed` are files done before the failure, `skipped` are files after
/// it that were never attempted.
#[derive(Debug)]
pub struct UploadReport<T> {
    pub completed: Vec<CompletedUpload<T>>,
    pub failure: Option<UploadFailure>,
    pub skipped: Vec<UploadFile>,
}

impl<T> UploadReport<T> {
    fn empty() -> Self {
        Self {
            completed: Vec::new(),
            failure: None,
            skipped: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }

    pub fn outputs(&self) -> impl Iterator<Item = &T> {
        self.completed.iter().map(|c| &c.output)
    }

    /// Collapse into the outputs, or the error of the failing file.
    pub fn into_result(self) -> Result<Vec<T>> {
        match self.failure {
            Some(failure) => Err(failure.error),
            None => Ok(self.completed.into_iter().map(|c| c.output).collect()),
        }
    }
}

/// Run `step` over `files` one at a time, in order, stopping at the first
/// error. No rollback is attempted for files completed before the failure.
pub async fn run_sequence<T, F, Fut>(files: Vec<UploadFile>, mut step: F) -> UploadReport<T>
where
    F: FnMut(UploadFile) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let total = files.len();
    let mut report = UploadReport::empty();
    let mut remaining = files.into_iter().enumerate();

    while let Some((index, file)) = remaining.next() {
        match step(file.clone()).await {
            Ok(output) => {
                info!(file = %file.original_name, position = index + 1, total, "Upload completed");
                report.completed.push(CompletedUpload { file, output });
            }
            Err(error) => {
                warn!(file = %file.original_name, position = index + 1, total, error = %error, "Upload failed, stopping");
                report.failure = Some(UploadFailure { index, file, error });
                report.skipped = remaining.by_ref().map(|(_, file)| file).collect();
                break;
            }
        }
    }

    report
}
