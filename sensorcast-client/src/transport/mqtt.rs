use std::fs;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use rumqttc::{
    AsyncClient, ConnAck, ConnectionError, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS,
    TlsConfiguration, Transport as MqttSocket,
};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use super::{Backoff, IncomingMessage, MessageHandler, Transport, WebsocketSigner};
use crate::configs::{BrokerConfig, Security, Transport as TransportSettings, WEBSOCKET_PORT};
use crate::errors::TransportError;

/// ALPN protocol that lets AWS IoT accept mutual TLS on port 443.
const AWS_IOT_MTLS_ALPN: &[u8] = b"x-amzn-mqtt-ca";

struct Subscription {
    filter: String,
    qos: QoS,
    handler: MessageHandler,
}

type Subscriptions = Arc<RwLock<Vec<Subscription>>>;

/// Material the broker connection authenticates with: PEM files read from
/// the paths on the command line, plus the handshake signer for websockets.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub ca: Vec<u8>,
    pub client_auth: Option<(Vec<u8>, Vec<u8>)>,
    pub signer: Option<WebsocketSigner>,
}

impl Credentials {
    pub fn load(broker: &BrokerConfig) -> Result<Self, TransportError> {
        match &broker.security {
            Security::MutualTls { root_ca, cert, key } => Ok(Self {
                ca: read_credential(root_ca)?,
                client_auth: Some((read_credential(cert)?, read_credential(key)?)),
                signer: None,
            }),
            Security::WebSocket { root_ca } => Ok(Self {
                ca: read_credential(root_ca)?,
                client_auth: None,
                signer: Some(WebsocketSigner::from_env(&broker.endpoint)?),
            }),
        }
    }
}

fn read_credential(path: &Path) -> Result<Vec<u8>, TransportError> {
    fs::read(path).map_err(|source| TransportError::ReadCredential {
        path: path.to_path_buf(),
        source,
    })
}

/// Translates the broker configuration into `rumqttc` options.
pub fn mqtt_options(
    broker: &BrokerConfig,
    settings: &TransportSettings,
    credentials: Credentials,
) -> MqttOptions {
    let Credentials { ca, client_auth, signer } = credentials;

    let (host, transport) = match broker.security {
        Security::MutualTls { .. } => {
            let alpn = (broker.port == WEBSOCKET_PORT).then(|| vec![AWS_IOT_MTLS_ALPN.to_vec()]);
            let transport = MqttSocket::Tls(TlsConfiguration::Simple {
                ca,
                alpn,
                client_auth,
            });
            (broker.endpoint.clone(), transport)
        }
        Security::WebSocket { .. } => {
            // rumqttc takes the full url for websockets and ignores the port argument
            let url = format!("wss://{}:{}/mqtt", broker.endpoint, broker.port);
            let transport = MqttSocket::Wss(TlsConfiguration::Simple {
                ca,
                alpn: None,
                client_auth: None,
            });
            (url, transport)
        }
    };

    let mut options = MqttOptions::new(&broker.client_id, host, broker.port);
    options.set_keep_alive(settings.keep_alive());
    options.set_clean_session(true);
    options.set_pending_throttle(settings.draining_interval());
    options.set_transport(transport);
    broker.connection.apply(&mut options);

    if let Some(signer) = signer {
        options.set_request_modifier(move |request| {
            let signed = signer.sign_handshake(request);
            async move { signed }
        });
    }

    options
}

/// [`Transport`] backed by a `rumqttc` client whose event loop runs on its own
/// task once connected.
pub struct MqttTransport {
    options: MqttOptions,
    settings: TransportSettings,
    client: Option<AsyncClient>,
    subscriptions: Subscriptions,
    event_loop: Option<JoinHandle<()>>,
}

impl MqttTransport {
    pub fn new(broker: &BrokerConfig, settings: &TransportSettings) -> Result<Self, TransportError> {
        let credentials = Credentials::load(broker)?;

        Ok(Self::with_options(mqtt_options(broker, settings, credentials), settings))
    }

    pub fn with_options(options: MqttOptions, settings: &TransportSettings) -> Self {
        Self {
            options,
            settings: settings.clone(),
            client: None,
            subscriptions: Arc::new(RwLock::new(Vec::new())),
            event_loop: None,
        }
    }

    fn client(&self) -> Result<&AsyncClient, TransportError> {
        self.client.as_ref().ok_or(TransportError::NotConnected)
    }
}

#[async_trait]
impl Transport for MqttTransport {
    async fn connect(&mut self) -> Result<(), TransportError> {
        let (client, mut event_loop) =
            AsyncClient::new(self.options.clone(), self.settings.max_queued_messages);

        let connect_timeout = self.settings.connect_timeout();
        let ack = time::timeout(connect_timeout, wait_for_connack(&mut event_loop))
            .await
            .map_err(|_| TransportError::ConnectTimeout(connect_timeout))??;

        tracing::info!(
            "Connected to {:?} (session present: {})",
            self.options.broker_address(),
            ack.session_present
        );

        self.event_loop = Some(tokio::spawn(drive_event_loop(
            event_loop,
            client.clone(),
            Arc::clone(&self.subscriptions),
            Backoff::new(&self.settings.backoff),
        )));
        self.client = Some(client);

        Ok(())
    }

    async fn subscribe(
        &self,
        topic: &str,
        qos: QoS,
        handler: MessageHandler,
    ) -> Result<(), TransportError> {
        let client = self.client()?;

        self.subscriptions.write().await.push(Subscription {
            filter: topic.to_string(),
            qos,
            handler,
        });

        let timeout = self.settings.operation_timeout();
        let result = match time::timeout(timeout, client.subscribe(topic, qos)).await {
            Ok(result) => result.map_err(TransportError::from),
            Err(_) => Err(TransportError::OperationTimeout(timeout)),
        };

        if result.is_err() {
            self.subscriptions.write().await.retain(|s| s.filter != topic);
        }

        result
    }

    async fn publish(&self, topic: &str, payload: Vec<u8>, qos: QoS) -> Result<(), TransportError> {
        let client = self.client()?;
        let timeout = self.settings.operation_timeout();

        time::timeout(timeout, client.publish(topic, qos, false, payload))
            .await
            .map_err(|_| TransportError::OperationTimeout(timeout))??;

        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        let Some(client) = self.client.take() else {
            return Ok(());
        };

        let timeout = self.settings.connect_timeout();
        let result = match time::timeout(timeout, client.disconnect()).await {
            Ok(result) => result.map_err(TransportError::from),
            Err(_) => Err(TransportError::OperationTimeout(timeout)),
        };

        if let Some(mut task) = self.event_loop.take() {
            if time::timeout(timeout, &mut task).await.is_err() {
                tracing::warn!("Event loop did not stop within {:?}, aborting it", timeout);
                task.abort();
            }
        }

        result
    }
}

impl Drop for MqttTransport {
    fn drop(&mut self) {
        if let Some(task) = self.event_loop.take() {
            task.abort();
        }
    }
}

async fn wait_for_connack(event_loop: &mut EventLoop) -> Result<ConnAck, TransportError> {
    loop {
        if let Event::Incoming(Packet::ConnAck(ack)) = event_loop.poll().await? {
            return Ok(ack);
        }
    }
}

async fn drive_event_loop(
    mut event_loop: EventLoop,
    client: AsyncClient,
    subscriptions: Subscriptions,
    mut backoff: Backoff,
) {
    backoff.connected(Instant::now());

    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let message = IncomingMessage {
                    topic: publish.topic.clone(),
                    payload: publish.payload.to_vec(),
                };
                dispatch(&subscriptions, message).await;
            }
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                tracing::info!("Reconnected to broker");
                backoff.connected(Instant::now());
                resubscribe(&client, &subscriptions).await;
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                tracing::debug!("Disconnect sent, stopping event loop");
                break;
            }
            Ok(_) => {}
            Err(ConnectionError::RequestsDone) => {
                tracing::debug!("All client handles dropped, stopping event loop");
                break;
            }
            Err(e) => {
                let delay = backoff.failed(Instant::now());
                tracing::warn!("MQTT connection error: {e}, reconnecting in {delay:?}");
                time::sleep(delay).await;
            }
        }
    }
}

async fn dispatch(subscriptions: &Subscriptions, message: IncomingMessage) {
    let subscriptions = subscriptions.read().await;

    for subscription in subscriptions
        .iter()
        .filter(|s| rumqttc::matches(&message.topic, &s.filter))
    {
        (subscription.handler)(message.clone());
    }
}

async fn resubscribe(client: &AsyncClient, subscriptions: &Subscriptions) {
    for subscription in subscriptions.read().await.iter() {
        // Requests are drained by this very task, so never wait on a full queue here
        if let Err(e) = client.try_subscribe(subscription.filter.as_str(), subscription.qos) {
            tracing::error!("Failed to resubscribe to {}: {e}", subscription.filter);
        }
    }
}
