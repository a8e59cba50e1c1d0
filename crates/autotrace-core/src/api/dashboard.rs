use serde::Deserialize;

use super::{ApiClient, Result};
use crate::models::DashboardSummaryItem;

#[derive(Debug, Deserialize)]
struct DashboardResponse {
    #[serde(default)]
    dashboard: Vec<DashboardSummaryItem>,
}

impl ApiClient {
    /// Fetch the per-vehicle maintenance overview
    pub async fn dashboard(&self) -> Result<Vec<DashboardSummaryItem>> {
        let response: DashboardResponse = self.get("/dashboard").await?;
        Ok(response.dashboard)
    }
}
