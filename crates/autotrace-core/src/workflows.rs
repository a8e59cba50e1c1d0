//! Operations that pair a direct-to-storage upload with an API call.

use tracing::info;

use crate::api::error::require_field;
use crate::api::{ApiClient, ApiError, CreateMaintenancePayload, Result};
use crate::models::{MaintenanceRecord, UploadCategory, VehiclePhoto};
use crate::upload::{run_sequence, UploadFile, UploadReport, Uploader};

/// Upload photos for a vehicle one by one, attaching each after its transfer.
///
/// Stops at the first failing file. Photos attached before the failure stay
/// attached.
pub async fn upload_vehicle_photos(
    api: &ApiClient,
    uploader: &Uploader,
    vehicle_id: &str,
    files: Vec<UploadFile>,
) -> Result<UploadReport<VehiclePhoto>> {
    require_field(vehicle_id, "Vehicle id")?;

    let report = run_sequence(files, |file| async move {
        let file_name = uploader.upload_file(UploadCategory::VehiclePhoto, &file).await?;
        let attached = api.attach_vehicle_photo(vehicle_id, &file_name).await?;
        Ok::<_, ApiError>(attached.photo)
    })
    .await;

    info!(
        vehicle_id,
        attached = report.completed.len(),
        skipped = report.skipped.len(),
        "Photo upload finished"
    );
    Ok(report)
}

/// Create a maintenance record, uploading its receipt first when given.
pub async fn create_maintenance(
    api: &ApiClient,
    uploader: &Uploader,
    vehicle_id: &str,
    mut payload: CreateMaintenancePayload,
    document: Option<UploadFile>,
) -> Result<MaintenanceRecord> {
    require_field(vehicle_id, "Vehicle id")?;
    payload.validate()?;

    if let Some(document) = document {
        let file_name = uploader
            .upload_file(UploadCategory::MaintenanceDocument, &document)
            .await?;
        payload.document_file_name = Some(file_name);
    }

    api.create_maintenance(vehicle_id, &payload).await
}
