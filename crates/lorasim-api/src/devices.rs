// Simulator device endpoints
//
// Listing, batched activation/uplink commands, per-device logs and deletion.

use tracing::debug;

use crate::client::SimulatorClient;
use crate::error::Error;
use crate::models::{DevEuiBatch, DeviceLogs, ListResponse, SimDevice};

impl SimulatorClient {
    /// List all simulated devices.
    ///
    /// `GET /devices`
    pub async fn list_devices(&self) -> Result<Vec<SimDevice>, Error> {
        let url = self.api_url("devices")?;
        debug!("listing devices");
        let envelope: ListResponse<SimDevice> = self.get(url).await?;
        Ok(envelope.response)
    }

    /// Join the given devices and start simulating them.
    ///
    /// `POST /devices/start` with `{"devEUIs": [...]}`
    pub async fn start_devices(&self, dev_euis: &[String]) -> Result<(), Error> {
        self.device_batch("devices/start", dev_euis).await
    }

    /// Stop the given devices (their uplinks stop with them).
    ///
    /// `POST /devices/stop`
    pub async fn stop_devices(&self, dev_euis: &[String]) -> Result<(), Error> {
        self.device_batch("devices/stop", dev_euis).await
    }

    /// Start periodic uplink generation.
    ///
    /// `POST /devices/uplink/start`
    pub async fn start_uplink(&self, dev_euis: &[String]) -> Result<(), Error> {
        self.device_batch("devices/uplink/start", dev_euis).await
    }

    /// Stop periodic uplink generation.
    ///
    /// `POST /devices/uplink/stop`
    pub async fn stop_uplink(&self, dev_euis: &[String]) -> Result<(), Error> {
        self.device_batch("devices/uplink/stop", dev_euis).await
    }

    /// Fetch the current log lines of one device.
    ///
    /// `GET /devices/{devEUI}/logs`
    pub async fn device_logs(&self, dev_eui: &str) -> Result<DeviceLogs, Error> {
        let url = self.api_url(&format!("devices/{dev_eui}/logs"))?;
        self.get(url).await
    }

    /// Delete a device.
    ///
    /// `DELETE /devices/{devEUI}`
    pub async fn delete_device(&self, dev_eui: &str) -> Result<(), Error> {
        let url = self.api_url(&format!("devices/{dev_eui}"))?;
        debug!(dev_eui, "deleting device");
        self.delete(url).await
    }

    async fn device_batch(&self, path: &str, dev_euis: &[String]) -> Result<(), Error> {
        let url = self.api_url(path)?;
        debug!(path, count = dev_euis.len(), "sending device batch");
        self.post_command(url, &DevEuiBatch { dev_euis }).await
    }
}
