use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::require_field;
use super::{ApiClient, ApiError, Result};
use crate::models::{MaintenanceRecord, Vehicle, VehicleCategory, VehiclePhoto, VehicleWithDetails};

/// First production automobile; anything older is a typo.
const MIN_VEHICLE_YEAR: i32 = 1886;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVehiclePayload {
    pub plate: String,
    pub model: String,
    pub manufacturer: String,
    pub year: i32,
    pub category: VehicleCategory,
    pub average_monthly_km: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_odometer: Option<u32>,
}

impl CreateVehiclePayload {
    /// Trim text fields and upper-case the plate.
    pub fn normalized(mut self) -> Self {
        self.plate = self.plate.trim().to_uppercase();
        self.model = self.model.trim().to_string();
        self.manufacturer = self.manufacturer.trim().to_string();
        self
    }

    pub fn validate(&self) -> Result<()> {
        require_field(&self.plate, "Plate")?;
        require_field(&self.model, "Model")?;
        require_field(&self.manufacturer, "Manufacturer")?;

        let max_year = Utc::now().year() + 1;
        if !(MIN_VEHICLE_YEAR..=max_year).contains(&self.year) {
            return Err(ApiError::validation(format!(
                "Year must be between {} and {}",
                MIN_VEHICLE_YEAR, max_year
            )));
        }
        if self.average_monthly_km == 0 {
            return Err(ApiError::validation("Average monthly km must be greater than zero"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMaintenancePayload {
    pub service_type: String,
    pub service_date: NaiveDate,
    pub odometer: u32,
    pub workshop: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_file_name: Option<String>,
}

impl CreateMaintenancePayload {
    pub fn validate(&self) -> Result<()> {
        require_field(&self.service_type, "Service type")?;
        require_field(&self.workshop, "Workshop")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttachPhotoResponse {
    pub vehicle: Vehicle,
    pub photo: VehiclePhoto,
}

#[derive(Debug, Deserialize)]
struct VehiclesResponse {
    #[serde(default)]
    vehicles: Vec<Vehicle>,
}

#[derive(Debug, Deserialize)]
struct VehicleResponse {
    vehicle: Vehicle,
}

#[derive(Debug, Deserialize)]
struct MaintenanceResponse {
    maintenance: MaintenanceRecord,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AttachPhotoRequest<'a> {
    file_name: &'a str,
}

impl ApiClient {
    // ===== Vehicles =====

    pub async fn list_vehicles(&self) -> Result<Vec<Vehicle>> {
        let response: VehiclesResponse = self.get("/vehicles").await?;
        debug!(count = response.vehicles.len(), "Vehicles fetched");
        Ok(response.vehicles)
    }

    pub async fn vehicle_details(&self, vehicle_id: &str) -> Result<VehicleWithDetails> {
        require_field(vehicle_id, "Vehicle id")?;
        self.get(&Self::endpoint(&["vehicles", vehicle_id])?).await
    }

    pub async fn create_vehicle(&self, payload: &CreateVehiclePayload) -> Result<Vehicle> {
        payload.validate()?;
        let response: VehicleResponse = self.post("/vehicles", payload).await?;
        Ok(response.vehicle)
    }

    pub async fn delete_vehicle(&self, vehicle_id: &str) -> Result<()> {
        require_field(vehicle_id, "Vehicle id")?;
        self.delete(&Self::endpoint(&["vehicles", vehicle_id])?).await
    }

    // ===== Photos =====

    /// Link an uploaded file to a vehicle
    pub async fn attach_vehicle_photo(
        &self,
        vehicle_id: &str,
        file_name: &str,
    ) -> Result<AttachPhotoResponse> {
        require_field(vehicle_id, "Vehicle id")?;
        require_field(file_name, "File name")?;
        self.post(
            &Self::endpoint(&["vehicles", vehicle_id, "photo"])?,
            &AttachPhotoRequest { file_name },
        )
        .await
    }

    pub async fn delete_vehicle_photo(&self, vehicle_id: &str, photo_id: &str) -> Result<()> {
        require_field(vehicle_id, "Vehicle id")?;
        require_field(photo_id, "Photo id")?;
        self.delete(&Self::endpoint(&["vehicles", vehicle_id, "photos", photo_id])?)
            .await
    }

    // ===== Maintenance =====

    pub async fn create_maintenance(
        &self,
        vehicle_id: &str,
        payload: &CreateMaintenancePayload,
    ) -> Result<MaintenanceRecord> {
        require_field(vehicle_id, "Vehicle id")?;
        payload.validate()?;
        let response: MaintenanceResponse = self
            .post(&Self::endpoint(&["vehicles", vehicle_id, "maintenance"])?, payload)
            .await?;
        Ok(response.maintenance)
    }
}
