use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub id: String,
    pub vehicle_id: String,
    pub vehicle_plate: String,
    pub generated_at: String,
    pub maintenance_count: u32,
    pub last_maintenance_date: Option<String>,
    pub overdue: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificateValidation {
    pub certificate: Certificate,
}
