// Simulator API HTTP client
//
// Wraps `reqwest::Client` with URL construction, status checking and
// response decoding. Endpoint groups (devices, gateways, dashboard) are
// implemented as inherent methods in separate files to keep this module
// focused on transport mechanics.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::ErrorBody;
use crate::transport::TransportConfig;

/// Raw HTTP client for the simulator backend.
///
/// All methods return decoded payloads; list envelopes are stripped
/// before the caller sees them.
#[derive(Debug, Clone)]
pub struct SimulatorClient {
    http: reqwest::Client,
    base_url: Url,
}

impl SimulatorClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the simulator API root, e.g. `http://localhost:5000/api`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The simulator base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for an API path relative to the base URL.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        let full = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Ok(Url::parse(&full)?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and decode the JSON body.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await?;
        let body = Self::checked_body(resp).await?;
        Self::decode(&body)
    }

    /// Send a POST request with a JSON body, discarding the response payload.
    pub(crate) async fn post_command(
        &self,
        url: Url,
        body: &impl Serialize,
    ) -> Result<(), Error> {
        debug!("POST {}", url);

        let resp = self.http.post(url).json(body).send().await?;
        let text = Self::checked_body(resp).await?;
        trace!(body = %text, "command acknowledged");
        Ok(())
    }

    /// Send a DELETE request, discarding the response payload.
    pub(crate) async fn delete(&self, url: Url) -> Result<(), Error> {
        debug!("DELETE {}", url);

        let resp = self.http.delete(url).send().await?;
        Self::checked_body(resp).await?;
        Ok(())
    }

    // ── Response handling ────────────────────────────────────────────

    /// Read the response body, turning non-2xx statuses into `Error::Status`.
    async fn checked_body(resp: reqwest::Response) -> Result<String, Error> {
        let status = resp.status();
        let body = resp.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(ErrorBody::into_message)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_owned()
            });

        Err(Error::Status {
            status: status.as_u16(),
            message,
        })
    }

    fn decode<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
        serde_json::from_str(body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: body.to_owned(),
        })
    }
}
