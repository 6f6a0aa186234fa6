use std::path::PathBuf;

use crate::telemetry::Mode;
use crate::transport::ConnectionFactory;

pub const MTLS_PORT: u16 = 8883;
pub const WEBSOCKET_PORT: u16 = 443;

/// How the client proves its identity to the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Security {
    /// X.509 mutual TLS over a raw socket.
    MutualTls {
        root_ca: PathBuf,
        cert: PathBuf,
        key: PathBuf,
    },
    /// MQTT over secure WebSocket, verified against the root CA only.
    WebSocket { root_ca: PathBuf },
}

impl Security {
    pub fn default_port(&self) -> u16 {
        match self {
            Security::MutualTls { .. } => MTLS_PORT,
            Security::WebSocket { .. } => WEBSOCKET_PORT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerConfig {
    pub endpoint: String,
    pub port: u16,
    pub client_id: String,
    pub security: Security,
    pub connection: ConnectionFactory,
}

/// Validated command line, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub broker: BrokerConfig,
    pub topic: String,
    pub mode: Mode,
    pub sensors: usize,
}
