mod backoff;
mod connection;
mod mqtt;
mod sigv4;

pub use backoff::*;
pub use connection::*;
pub use mqtt::*;
pub use sigv4::{region_from_endpoint, WebsocketSigner, IOT_SERVICE};

use std::sync::Arc;

use async_trait::async_trait;
pub use rumqttc::QoS;

use crate::errors::{ConfigError, TransportError};

/// A publish received on one of our subscriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

pub type MessageHandler = Arc<dyn Fn(IncomingMessage) + Send + Sync>;

/// The narrow slice of an MQTT client the telemetry loop relies on.
///
/// Implementations own reconnects, queueing and timeouts; every call returns
/// within the configured operation timeout.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn connect(&mut self) -> Result<(), TransportError>;

    async fn subscribe(
        &self,
        topic: &str,
        qos: QoS,
        handler: MessageHandler,
    ) -> Result<(), TransportError>;

    async fn publish(&self, topic: &str, payload: Vec<u8>, qos: QoS) -> Result<(), TransportError>;

    async fn disconnect(&mut self) -> Result<(), TransportError>;
}

pub fn qos_from_level(level: u8) -> Result<QoS, ConfigError> {
    match level {
        0 => Ok(QoS::AtMostOnce),
        1 => Ok(QoS::AtLeastOnce),
        2 => Ok(QoS::ExactlyOnce),
        other => Err(ConfigError::InvalidQos(other)),
    }
}
