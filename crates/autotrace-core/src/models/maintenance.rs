use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceRecord {
    pub id: String,
    pub vehicle_id: String,
    pub user_id: String,
    pub service_type: String,
    pub service_date: String,
    pub odometer: f64,
    pub workshop: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub document_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A future service point computed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceSuggestionCheckpoint {
    pub km_mark: f64,
    pub overdue: bool,
    #[serde(default)]
    pub checklist: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceSuggestions {
    pub estimated_current_km: f64,
    pub monthly_average_km: f64,
    pub next_maintenance_km: Option<f64>,
    pub km_to_next: Option<f64>,
    pub overdue: bool,
    pub estimated_due_date: Option<String>,
    #[serde(default)]
    pub checklist: Vec<String>,
    #[serde(default)]
    pub upcoming: Vec<MaintenanceSuggestionCheckpoint>,
}
