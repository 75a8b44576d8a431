//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use lorasim_config::ConfigError;
use lorasim_core::{ApiError, CoreError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const PARTIAL: i32 = 6;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("{message}")]
    #[diagnostic(
        code(lorasim::connection_failed),
        help(
            "Check that the simulator is running and reachable.\n\
             Override the URL with --url or set it with: lorasim config set url <URL>"
        )
    )]
    ConnectionFailed { message: String },

    // ── Fleet operations ─────────────────────────────────────────────

    #[error("{message}")]
    #[diagnostic(
        code(lorasim::rejected),
        help("Nothing was sent. Run: lorasim devices gates <IDS> to see what the selection allows")
    )]
    Rejected { message: String },

    #[error("{message}")]
    #[diagnostic(
        code(lorasim::remote_failed),
        help("The simulator refused the request; local state was left unchanged.")
    )]
    RemoteFailed { message: String },

    #[error("{message}")]
    #[diagnostic(
        code(lorasim::remote_unavailable),
        help("The simulator could not serve the request right now; local state was left unchanged. Retrying may succeed.")
    )]
    RemoteUnavailable { message: String },

    #[error("{message}")]
    #[diagnostic(
        code(lorasim::partial_delete),
        help("Records not listed were deleted. Retry with: lorasim {kind} delete {failed}")
    )]
    PartialDelete {
        message: String,
        kind: String,
        failed: String,
    },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(lorasim::not_found),
        help("Run: lorasim {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────

    #[error("API error ({code}): {message}")]
    #[diagnostic(code(lorasim::api_error))]
    ApiError { code: String, message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(lorasim::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(lorasim::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: lorasim config set url <URL> --profile {name}"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(lorasim::config))]
    Config(#[from] ConfigError),

    // ── Interactive ──────────────────────────────────────────────────

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(lorasim::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    #[diagnostic(code(lorasim::json))]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization failed: {0}")]
    #[diagnostic(code(lorasim::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::PartialDelete { .. } => exit_code::PARTIAL,
            Self::Rejected { .. }
            | Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Attach the record kind used in retry hints to a partial delete.
    pub fn for_kind(self, kind: &str) -> Self {
        match self {
            Self::PartialDelete {
                message, failed, ..
            } => Self::PartialDelete {
                message,
                kind: kind.into(),
                failed,
            },
            other => other,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        let retryable = err.is_retryable();
        match err {
            CoreError::Validation { .. } => CliError::Rejected { message },

            CoreError::RemoteCall {
                source: ApiError::Transport(ref e),
                ..
            } if e.status().is_none() => CliError::ConnectionFailed { message },
            CoreError::RemoteCall { .. } if retryable => CliError::RemoteUnavailable { message },
            CoreError::RemoteCall { .. } => CliError::RemoteFailed { message },

            CoreError::PartialDelete { ref failed, .. } => {
                let failed = failed
                    .iter()
                    .map(|f| f.id.to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                CliError::PartialDelete {
                    message,
                    kind: "devices".into(),
                    failed,
                }
            }

            CoreError::NotFound {
                entity_type,
                identifier,
            } => CliError::NotFound {
                list_command: format!("{entity_type}s list"),
                resource_type: entity_type,
                identifier,
            },

            CoreError::Api { message, status } => CliError::ApiError {
                code: status.map_or_else(|| "unknown".into(), |s| s.to_string()),
                message,
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}
