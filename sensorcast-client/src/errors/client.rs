use sensorcast_generator::ParamsError;

use super::{ConfigError, TelemetryError, TransportError};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("Transport error: {0}")]
    TransportError(#[from] TransportError),

    #[error("Telemetry error: {0}")]
    TelemetryError(#[from] TelemetryError),

    #[error("Generator error: {0}")]
    GeneratorError(#[from] ParamsError),
}
