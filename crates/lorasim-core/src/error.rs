// ── Core error types ──
//
// User-facing errors from lorasim-core. Every fleet operation failure
// names the action and the number of records it touched. Transport
// details stay wrapped in `RemoteCall` as the error source.

use thiserror::Error;

use crate::model::EntityId;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Fleet operation errors ───────────────────────────────────────
    /// A gate rejected the selection. No remote call was made.
    #[error("Cannot {action} {count} selected record(s): {reason}")]
    Validation {
        action: String,
        count: usize,
        reason: String,
    },

    /// The remote call failed. The registry was left untouched.
    #[error("Failed to {action} {count} record(s): {source}")]
    RemoteCall {
        action: String,
        count: usize,
        #[source]
        source: lorasim_api::Error,
    },

    /// Some of a batch of deletes failed. The registry reflects exactly
    /// the deletions that succeeded.
    #[error("Failed to delete {} of {total} record(s): {}", .failed.len(), failed_ids(.failed))]
    PartialDelete {
        total: usize,
        failed: Vec<DeleteFailure>,
    },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Entity not found: {entity_type} with id {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// One failed deletion inside a [`CoreError::PartialDelete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteFailure {
    pub id: EntityId,
    pub reason: String,
}

fn failed_ids(failed: &[DeleteFailure]) -> String {
    failed
        .iter()
        .map(|f| f.id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl CoreError {
    /// Ids whose deletion failed, if this is a partial delete.
    pub fn failed_ids(&self) -> Vec<EntityId> {
        match self {
            Self::PartialDelete { failed, .. } => failed.iter().map(|f| f.id.clone()).collect(),
            _ => Vec::new(),
        }
    }

    /// Whether retrying the same operation might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RemoteCall { source, .. } => source.is_transient(),
            Self::PartialDelete { .. } => true,
            Self::Api { status, .. } => status.is_some_and(|s| s >= 500),
            _ => false,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<lorasim_api::Error> for CoreError {
    fn from(err: lorasim_api::Error) -> Self {
        match err {
            lorasim_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            lorasim_api::Error::ClientSetup(message) => CoreError::Config { message },
            lorasim_api::Error::Status { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            lorasim_api::Error::Transport(ref e) => CoreError::Api {
                message: e.to_string(),
                status: e.status().map(|s| s.as_u16()),
            },
            lorasim_api::Error::Deserialization { message, body: _ } => CoreError::Api {
                message: format!("Unexpected response from simulator: {message}"),
                status: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_names_action_and_count() {
        let err = CoreError::Validation {
            action: "stop".into(),
            count: 2,
            reason: "every selected device must be playing".into(),
        };
        assert_eq!(
            err.to_string(),
            "Cannot stop 2 selected record(s): every selected device must be playing"
        );
    }

    #[test]
    fn partial_delete_lists_failed_ids() {
        let err = CoreError::PartialDelete {
            total: 3,
            failed: vec![
                DeleteFailure {
                    id: EntityId::from("D2"),
                    reason: "HTTP 500".into(),
                },
                DeleteFailure {
                    id: EntityId::from("G1"),
                    reason: "HTTP 404".into(),
                },
            ],
        };
        assert_eq!(err.to_string(), "Failed to delete 2 of 3 record(s): D2, G1");
        assert_eq!(err.failed_ids(), vec![EntityId::from("D2"), EntityId::from("G1")]);
    }

    #[test]
    fn remote_call_keeps_source() {
        let err = CoreError::RemoteCall {
            action: "start uplink on".into(),
            count: 1,
            source: lorasim_api::Error::Status {
                status: 503,
                message: "busy".into(),
            },
        };
        assert!(err.to_string().starts_with("Failed to start uplink on 1 record(s)"));
        assert!(err.is_retryable());
    }
}
