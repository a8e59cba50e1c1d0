use std::path::Path;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH};
use reqwest::Method;
use tracing::{debug, info, warn};

use super::{run_sequence, UploadFile, UploadReport};
use crate::api::{ApiClient, ApiError, Result};
use crate::models::{PresignedUpload, UploadCategory, UploadRequest};

/// Floor for a storage transfer, independent of the API request timeout
const TRANSFER_TIMEOUT_SECS: u64 = 120;

/// Extra second allowed per this many bytes sent
const TRANSFER_BYTES_PER_SEC: u64 = 256 * 1024;

/// Time allowed for sending `len` bytes to storage.
pub fn transfer_timeout(len: usize) -> Duration {
    Duration::from_secs(TRANSFER_TIMEOUT_SECS + len as u64 / TRANSFER_BYTES_PER_SEC)
}

/// Turn a presigned upload URL into an absolute one.
///
/// Absolute `http(s)://` URLs pass through; anything else is joined onto
/// the API base URL.
pub fn resolve_upload_url(base_url: &str, upload_url: &str) -> String {
    let upload_url = upload_url.trim();
    let lower = upload_url.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return upload_url.to_string();
    }

    let base = base_url.trim_end_matches('/');
    if upload_url.starts_with('/') {
        format!("{}{}", base, upload_url)
    } else {
        format!("{}/{}", base, upload_url)
    }
}

/// Requests upload slots and sends files to them.
#[derive(Clone)]
pub struct Uploader {
    api: ApiClient,
}

impl Uploader {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn request_upload(&self, request: &UploadRequest) -> Result<PresignedUpload> {
        self.api.request_upload(request).await
    }

    /// Send a local file to its presigned destination.
    ///
    /// Consumes the slot. No bearer token is attached and failures are not
    /// retried, expired slots included.
    pub async fn transfer(&self, local_path: &Path, upload: PresignedUpload) -> Result<()> {
        let target = resolve_upload_url(self.api.base_url(), &upload.upload_url);
        let method = Method::from_bytes(upload.upload_method.trim().to_ascii_uppercase().as_bytes())
            .map_err(|_| {
                ApiError::InvalidRequest(format!("Unsupported upload method: {}", upload.upload_method))
            })?;

        if upload.is_expired() {
            warn!(file_name = %upload.file_name, expires_at = %upload.expires_at, "Upload slot already expired");
        }

        let bytes = tokio::fs::read(local_path)
            .await
            .map_err(|source| ApiError::File {
                path: local_path.to_path_buf(),
                source,
            })?;

        let mut headers = HeaderMap::new();
        for (name, value) in &upload.upload_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ApiError::InvalidRequest(format!("Invalid upload header name: {}", name)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| ApiError::InvalidRequest(format!("Invalid value for upload header {}", name)))?;
            headers.insert(name, value);
        }
        headers.insert(CONTENT_LENGTH, HeaderValue::from(bytes.len()));

        let timeout = transfer_timeout(bytes.len());
        debug!(%method, url = %target, bytes = bytes.len(), ?timeout, "Transferring file");

        // Overrides the client-wide API timeout for this request only.
        let response = self
            .api
            .http()
            .request(method, &target)
            .timeout(timeout)
            .headers(headers)
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            info!(file_name = %upload.file_name, "Transfer complete");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        warn!(file_name = %upload.file_name, %status, "Transfer rejected by storage");
        if body.trim().is_empty() {
            Err(ApiError::UploadFailed(format!(
                "Upload failed with status {}",
                status.as_u16()
            )))
        } else {
            Err(ApiError::UploadFailed(body))
        }
    }

    /// Presign and transfer one file; returns the server-side file name.
    pub async fn upload_file(&self, category: UploadCategory, file: &UploadFile) -> Result<String> {
        let upload = self
            .request_upload(&UploadRequest {
                category,
                original_name: file.original_name.clone(),
                content_type: file.content_type.clone(),
            })
            .await?;

        let file_name = upload.file_name.clone();
        self.transfer(&file.path, upload).await?;
        Ok(file_name)
    }

    /// Upload files one after another, stopping at the first failure.
    pub async fn upload_all(
        &self,
        category: UploadCategory,
        files: Vec<UploadFile>,
    ) -> UploadReport<String> {
        run_sequence(files, |file| async move { self.upload_file(category, &file).await }).await
    }
}
