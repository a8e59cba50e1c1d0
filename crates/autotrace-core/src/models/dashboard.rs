use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummaryItem {
    pub vehicle_id: String,
    #[serde(default)]
    pub vehicle_plate: Option<String>,
    pub total_maintenances: u32,
    pub last_maintenance_date: Option<String>,
    pub next_maintenance_km: Option<f64>,
    pub overdue: bool,
}

impl DashboardSummaryItem {
    pub fn status_label(&self) -> &'static str {
        if self.overdue {
            "Overdue"
        } else if self.next_maintenance_km.is_some() {
            "Scheduled"
        } else {
            "No plan"
        }
    }
}
