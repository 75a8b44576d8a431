//! Fleet control and log-polling core for the LoRaWAN device simulator.
//!
//! This crate sits between `lorasim-api` and the operator-facing CLI:
//!
//! - **[`Controller`]**: Facade owning the registry, the dispatcher and
//!   the background refresh task.
//!
//! - **[`DataStore`]**: The fleet registry. Lock-free reactive storage
//!   built on `EntityCollection<T>` (`DashMap` + `tokio::sync::watch`),
//!   mutated only by patch upserts, removals and full refreshes.
//!
//! - **[`Dispatcher`]**: Selection-gated batched commands
//!   (start/stop devices, start/stop uplink) and confirmed deletes.
//!   Gates are re-evaluated against the registry on every call.
//!
//! - **[`LogMonitor`]**: One cancellable periodic log fetch loop per open
//!   log view, with generation-checked result application.
//!
//! - **[`FleetApi`]**: The remote seam, implemented for
//!   [`lorasim_api::SimulatorClient`].

pub mod api;
pub mod command;
pub mod config;
pub mod controller;
pub mod convert;
pub mod dispatcher;
pub mod error;
pub mod model;
pub mod monitor;
pub mod selection;
pub mod store;
pub mod stream;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use api::{ApiError, FleetApi};
pub use command::{CommandResult, Confirm, DeleteOutcome, FleetCommand, GateState};
pub use config::{ControllerConfig, DEFAULT_LOG_POLL_INTERVAL, DEFAULT_URL};
pub use controller::Controller;
pub use dispatcher::Dispatcher;
pub use error::{CoreError, DeleteFailure};
pub use monitor::LogMonitor;
pub use selection::Selection;
pub use store::DataStore;
pub use stream::{DeviceFilter, EntityStream, GatewayFilter};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    ActivationState, DevicePatch, DeviceRecord, EntityId, FleetRecord, FleetSummary,
    GatewayRecord, LogSnapshot, LogStatus, MacAddress, NO_LOGS_PLACEHOLDER, UplinkState,
};
