use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UploadCategory {
    VehiclePhoto,
    MaintenanceDocument,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub category: UploadCategory,
    pub original_name: String,
    pub content_type: String,
}

/// A server-issued, time-limited upload destination.
///
/// Deliberately not `Clone`: one slot feeds exactly one transfer, which
/// consumes it.
#[derive(Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUpload {
    pub file_name: String,
    pub upload_url: String,
    pub upload_method: String,
    #[serde(default)]
    pub upload_headers: HashMap<String, String>,
    pub public_url: String,
    pub expires_at: DateTime<Utc>,
}

impl PresignedUpload {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_wire_names() {
        assert_eq!(
            serde_json::to_string(&UploadCategory::VehiclePhoto).unwrap(),
            "\"vehicle-photo\""
        );
        assert_eq!(
            serde_json::to_string(&UploadCategory::MaintenanceDocument).unwrap(),
            "\"maintenance-document\""
        );
    }

    #[test]
    fn test_parse_presigned_upload() {
        let json = r#"{
            "fileName": "photos/abc.jpg",
            "uploadUrl": "/uploads/local/abc",
            "uploadMethod": "PUT",
            "uploadHeaders": {"Content-Type": "image/jpeg"},
            "publicUrl": "http://cdn.test/photos/abc.jpg",
            "expiresAt": "2000-01-01T00:00:00Z"
        }"#;
        let upload: PresignedUpload = serde_json::from_str(json).unwrap();
        assert_eq!(upload.upload_headers.get("Content-Type").map(String::as_str), Some("image/jpeg"));
        assert!(upload.is_expired());
    }
}
