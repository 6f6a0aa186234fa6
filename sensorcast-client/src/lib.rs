use tokio::signal;

use crate::configs::{ClientConfig, Settings};
use crate::errors::ClientError;
use crate::telemetry::{build_sensors, LoopOptions, TelemetryLoop};
use crate::transport::MqttTransport;

pub mod cli;
pub mod configs;
pub mod errors;
pub mod logging;
pub mod telemetry;
pub mod transport;

pub async fn run(config: ClientConfig, settings: &Settings) -> Result<(), ClientError> {
    let ClientConfig { broker, topic, mode, sensors } = config;

    tracing::debug!("host: {}", broker.endpoint);
    tracing::debug!("port: {}", broker.port);
    tracing::debug!("clientId: {}", broker.client_id);
    tracing::debug!("topic: {}", topic);
    tracing::debug!("mode: {}", mode);
    tracing::debug!("numOfSensors: {}", sensors);
    tracing::debug!("connection: {}", broker.connection);

    let sensors = build_sensors(sensors, settings.generator.params(), settings.generator.seed)?;
    let options = LoopOptions::from_settings(&settings.telemetry)?;
    let mut transport = MqttTransport::new(&broker, &settings.transport)?;

    let mut telemetry = TelemetryLoop::new(topic, mode, sensors, options);
    telemetry.run(&mut transport, shutdown_signal()).await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!("Failed to listen for the interrupt signal: {e}");
        std::future::pending::<()>().await;
    }
}
