use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MaintenanceRecord, MaintenanceSuggestions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleCategory {
    Car,
    Motorcycle,
    Truck,
    Other,
}

impl VehicleCategory {
    pub fn label(&self) -> &'static str {
        match self {
            VehicleCategory::Car => "Car",
            VehicleCategory::Motorcycle => "Motorcycle",
            VehicleCategory::Truck => "Truck",
            VehicleCategory::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: String,
    pub user_id: String,
    pub plate: String,
    pub model: String,
    pub manufacturer: String,
    pub year: i32,
    pub category: VehicleCategory,
    pub average_monthly_km: f64,
    #[serde(default)]
    pub initial_odometer: Option<f64>,
    #[serde(default)]
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vehicle {
    /// "Manufacturer Model (Year)"
    pub fn display_name(&self) -> String {
        format!("{} {} ({})", self.manufacturer, self.model, self.year)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehiclePhoto {
    pub id: String,
    pub vehicle_id: String,
    pub file_name: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

/// Everything the vehicle screen needs in one response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleWithDetails {
    pub vehicle: Vehicle,
    #[serde(default)]
    pub photos: Vec<VehiclePhoto>,
    #[serde(default)]
    pub maintenances: Vec<MaintenanceRecord>,
    pub suggestions: MaintenanceSuggestions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vehicle_details() {
        let json = r#"{
            "vehicle": {
                "id": "v1", "userId": "u1", "plate": "ABC1D23", "model": "Onix",
                "manufacturer": "Chevrolet", "year": 2021, "category": "car",
                "averageMonthlyKm": 1200, "initialOdometer": null, "photoUrl": null,
                "createdAt": "2024-01-01T00:00:00Z", "updatedAt": "2024-01-02T00:00:00Z"
            },
            "photos": [
                {"id": "p1", "vehicleId": "v1", "fileName": "front.jpg",
                 "url": "https://cdn.test/front.jpg", "createdAt": "2024-01-03T00:00:00Z"}
            ],
            "maintenances": [],
            "suggestions": {
                "estimatedCurrentKm": 32400.5, "monthlyAverageKm": 1200,
                "nextMaintenanceKm": 40000, "kmToNext": 7599.5, "overdue": false,
                "estimatedDueDate": "2024-08-01", "checklist": ["Oil change"],
                "upcoming": [{"kmMark": 40000, "overdue": false, "checklist": ["Oil change", "Filters"]}]
            }
        }"#;

        let details: VehicleWithDetails = serde_json::from_str(json).unwrap();
        assert_eq!(details.vehicle.display_name(), "Chevrolet Onix (2021)");
        assert_eq!(details.vehicle.category, VehicleCategory::Car);
        assert_eq!(details.photos.len(), 1);
        assert_eq!(details.suggestions.upcoming[0].checklist.len(), 2);
        assert_eq!(details.suggestions.next_maintenance_km, Some(40000.0));
    }
}
