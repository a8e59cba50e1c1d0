use std::path::{Path, PathBuf};

use chrono::Utc;
use reqwest::Method;
use tracing::info;

use super::error::require_field;
use super::{ApiClient, ApiError, Result};
use crate::models::CertificateValidation;

impl ApiClient {
    /// Check a certificate id against the server
    pub async fn validate_certificate(&self, certificate_id: &str) -> Result<CertificateValidation> {
        require_field(certificate_id, "Certificate id")?;
        self.get(&Self::endpoint(&["certificates", "validate", certificate_id])?)
            .await
    }

    /// Download the PDF certificate for a vehicle into `dest_dir`.
    ///
    /// The request carries its own bearer header; returns the written path.
    pub async fn download_certificate(&self, vehicle_id: &str, dest_dir: &Path) -> Result<PathBuf> {
        require_field(vehicle_id, "Vehicle id")?;
        let token = self
            .token()
            .ok_or_else(|| ApiError::validation("Sign in to download certificates"))?;

        let builder = self
            .request(Method::GET, &Self::endpoint(&["certificates", vehicle_id])?)
            .bearer_auth(token);
        let response = self.send(builder).await?;
        let bytes = response.bytes().await?;

        tokio::fs::create_dir_all(dest_dir)
            .await
            .map_err(|source| ApiError::File {
                path: dest_dir.to_path_buf(),
                source,
            })?;

        let file_name = format!(
            "certificate-{}-{}.pdf",
            file_stem(vehicle_id),
            Utc::now().timestamp_millis()
        );
        let path = dest_dir.join(file_name);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|source| ApiError::File {
                path: path.clone(),
                source,
            })?;

        info!(path = %path.display(), bytes = bytes.len(), "Certificate downloaded");
        Ok(path)
    }
}

/// Keep an id usable as part of a single file name.
fn file_stem(id: &str) -> String {
    id.trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
