// Simulator gateway endpoints

use tracing::debug;

use crate::client::SimulatorClient;
use crate::error::Error;
use crate::models::{ListResponse, SimGateway};

impl SimulatorClient {
    /// List all gateways, real and virtual.
    ///
    /// `GET /gateways`
    pub async fn list_gateways(&self) -> Result<Vec<SimGateway>, Error> {
        let url = self.api_url("gateways")?;
        debug!("listing gateways");
        let envelope: ListResponse<SimGateway> = self.get(url).await?;
        Ok(envelope.response)
    }

    /// Delete a gateway by object id.
    ///
    /// `DELETE /gateways/{id}`
    pub async fn delete_gateway(&self, id: &str) -> Result<(), Error> {
        let url = self.api_url(&format!("gateways/{id}"))?;
        debug!(id, "deleting gateway");
        self.delete(url).await
    }
}
