// Simulator dashboard endpoint

use crate::client::SimulatorClient;
use crate::error::Error;
use crate::models::DashboardSummary;

impl SimulatorClient {
    /// Fleet counters shown on the dashboard.
    ///
    /// `GET /dashboard/summary`
    pub async fn dashboard_summary(&self) -> Result<DashboardSummary, Error> {
        let url = self.api_url("dashboard/summary")?;
        self.get(url).await
    }
}
