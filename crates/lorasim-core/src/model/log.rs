// ── Log session types ──

use serde::{Deserialize, Serialize};
use std::fmt;

use super::entity_id::EntityId;

/// Line shown when the simulator returns no log entries for a device.
pub const NO_LOGS_PLACEHOLDER: &str = "No logs found for this device.";

/// Lifecycle of a log view: `Idle -> Loading -> (Ready | Error) -> Loading -> ...`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Error,
}

impl fmt::Display for LogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Error => "error",
        })
    }
}

/// Point-in-time view of a log session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSnapshot {
    pub target: Option<EntityId>,
    pub status: LogStatus,
    pub buffer: Vec<String>,
    /// Most recent fetch failure, cleared by the next successful fetch.
    pub last_error: Option<String>,
}

impl LogSnapshot {
    pub fn is_active(&self) -> bool {
        self.target.is_some()
    }
}
