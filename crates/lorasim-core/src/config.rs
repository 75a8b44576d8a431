// ── Runtime connection configuration ──
//
// Describes *how* to reach a simulator backend and how often to poll it.
// Never touches disk: the CLI builds a `ControllerConfig` and hands it in.

use std::time::Duration;

use url::Url;

/// Default simulator API endpoint.
pub const DEFAULT_URL: &str = "http://localhost:5000/api";

/// Period between log fetches while a log view is open.
pub const DEFAULT_LOG_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Configuration for one simulator backend.
///
/// Built by the CLI, passed to `Controller` -- core never reads config files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Simulator API base URL (e.g., `http://localhost:5000/api`).
    pub url: Url,
    /// Request timeout.
    pub timeout: Duration,
    /// Skip TLS certificate verification.
    pub accept_invalid_certs: bool,
    /// How often to perform a full registry refresh (seconds). 0 = never.
    pub refresh_interval_secs: u64,
    /// Period of the log monitor's fetch loop.
    pub log_poll_interval: Duration,
}

impl ControllerConfig {
    /// Configuration for `url` with default timings.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            timeout: Duration::from_secs(30),
            accept_invalid_certs: false,
            refresh_interval_secs: 60,
            log_poll_interval: DEFAULT_LOG_POLL_INTERVAL,
        }
    }

    /// Parse `raw` as the base URL and use default timings.
    pub fn from_url_str(raw: &str) -> Result<Self, url::ParseError> {
        Url::parse(raw).map(Self::new)
    }
}
