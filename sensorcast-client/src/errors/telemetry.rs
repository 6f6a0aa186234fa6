use super::TransportError;

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("Failed to connect: {0}")]
    Connect(#[source] TransportError),

    #[error("Failed to encode telemetry message: {0}")]
    Encode(#[from] serde_json::Error),
}
