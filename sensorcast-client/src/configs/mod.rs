mod client;
mod settings;

pub use client::{BrokerConfig, ClientConfig, Security, MTLS_PORT, WEBSOCKET_PORT};
pub use settings::{Backoff, Generator, Logger, Settings, Telemetry, Transport};
