use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use sensorcast_client::errors::TransportError;
use sensorcast_client::telemetry::TelemetryMessage;
use sensorcast_client::transport::{IncomingMessage, MessageHandler, QoS, Transport};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Connect,
    Subscribe { topic: String, qos: QoS },
    Publish { topic: String, payload: Vec<u8>, qos: QoS },
    Disconnect,
}

/// Records every call, including the ones it is told to fail.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    pub calls: Arc<Mutex<Vec<Call>>>,
    handlers: Arc<Mutex<Vec<(String, MessageHandler)>>>,
    fail_connect: bool,
    fail_subscribe: bool,
    fail_device: Option<String>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_connect() -> Self {
        Self {
            fail_connect: true,
            ..Self::default()
        }
    }

    pub fn failing_subscribe() -> Self {
        Self {
            fail_subscribe: true,
            ..Self::default()
        }
    }

    pub fn failing_publish_for(device: &str) -> Self {
        Self {
            fail_device: Some(device.to_string()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Decoded payloads of every publish attempt, in order.
    pub fn published(&self) -> Vec<TelemetryMessage> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Publish { payload, .. } => Some(serde_json::from_slice(&payload).unwrap()),
                _ => None,
            })
            .collect()
    }

    pub fn count_subscribes(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Subscribe { .. }))
            .count()
    }

    /// Feeds a message to every handler registered for `topic`.
    pub fn deliver(&self, topic: &str, payload: &[u8]) -> usize {
        let handlers = self.handlers.lock().unwrap();
        let mut delivered = 0;
        for (filter, handler) in handlers.iter() {
            if filter == topic {
                handler(IncomingMessage {
                    topic: topic.to_string(),
                    payload: payload.to_vec(),
                });
                delivered += 1;
            }
        }
        delivered
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn connect(&mut self) -> Result<(), TransportError> {
        self.record(Call::Connect);
        if self.fail_connect {
            return Err(TransportError::NotConnected);
        }
        Ok(())
    }

    async fn subscribe(
        &self,
        topic: &str,
        qos: QoS,
        handler: MessageHandler,
    ) -> Result<(), TransportError> {
        self.record(Call::Subscribe {
            topic: topic.to_string(),
            qos,
        });
        if self.fail_subscribe {
            return Err(TransportError::NotConnected);
        }
        self.handlers.lock().unwrap().push((topic.to_string(), handler));
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: Vec<u8>, qos: QoS) -> Result<(), TransportError> {
        let message: TelemetryMessage = serde_json::from_slice(&payload).unwrap();
        self.record(Call::Publish {
            topic: topic.to_string(),
            payload,
            qos,
        });
        if self.fail_device.as_deref() == Some(message.device.as_str()) {
            return Err(TransportError::NotConnected);
        }
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        self.record(Call::Disconnect);
        Ok(())
    }
}
