pub mod client;
pub mod configuration;
pub mod telemetry;
pub mod transport;

pub use client::ClientError;
pub use configuration::ConfigError;
pub use telemetry::TelemetryError;
pub use transport::TransportError;
