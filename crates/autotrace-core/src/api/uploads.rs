use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info};

use super::error::require_field;
use super::{ApiClient, Result};
use crate::models::{PresignedUpload, UploadRequest};

/// Presigning can be slow on cold storage backends.
const PRESIGN_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct PresignResponse {
    upload: PresignedUpload,
}

impl ApiClient {
    /// Ask the server for a one-time upload destination
    pub async fn request_upload(&self, request: &UploadRequest) -> Result<PresignedUpload> {
        require_field(&request.original_name, "File name")?;
        require_field(&request.content_type, "Content type")?;

        info!(
            category = ?request.category,
            original_name = %request.original_name,
            content_type = %request.content_type,
            "Requesting upload slot"
        );

        let response: PresignResponse = self
            .post_with_timeout(
                "/uploads/presign",
                request,
                Some(Duration::from_secs(PRESIGN_TIMEOUT_SECS)),
            )
            .await
            .inspect_err(|e| error!(error = %e, "Failed to obtain upload slot"))?;

        info!(
            file_name = %response.upload.file_name,
            expires_at = %response.upload.expires_at,
            "Upload slot issued"
        );
        Ok(response.upload)
    }
}
