// lorasim-api: Async Rust client for the LoRaWAN device simulator REST API

pub mod client;
pub mod dashboard;
pub mod devices;
pub mod error;
pub mod gateways;
pub mod models;
pub mod transport;

pub use client::SimulatorClient;
pub use error::Error;
pub use transport::TransportConfig;
