use std::io;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to read credential {path:?}: {source}")]
    ReadCredential {
        path: PathBuf,
        source: io::Error,
    },

    #[error("Connection error: {0}")]
    Connection(#[from] rumqttc::ConnectionError),

    #[error("Client request failed: {0}")]
    Client(#[from] rumqttc::ClientError),

    #[error("Broker did not accept the connection within {0:?}")]
    ConnectTimeout(Duration),

    #[error("Operation timed out after {0:?}")]
    OperationTimeout(Duration),

    #[error("Transport is not connected")]
    NotConnected,

    #[error("WebSocket mode needs AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY")]
    MissingAwsCredentials,

    #[error("Cannot tell the AWS region of {0}, set AWS_REGION")]
    UnknownRegion(String),

    #[error("Failed to sign the websocket handshake: {0}")]
    Signing(#[source] Box<dyn std::error::Error + Send + Sync>),
}
