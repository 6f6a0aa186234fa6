use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};

use super::message::{now_millis, TelemetryMessage};
use super::{Mode, Sensor};
use crate::configs::Telemetry as TelemetrySettings;
use crate::errors::{ConfigError, TelemetryError};
use crate::transport::{qos_from_level, IncomingMessage, QoS, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Connecting,
    Connected,
    Subscribed,
    Running,
    Terminated,
}

#[derive(Debug, Clone)]
pub struct LoopOptions {
    pub interval: Duration,
    /// Pause between connecting and the first tick.
    pub settle: Duration,
    pub perturbation_probability: f64,
    pub qos: QoS,
}

impl LoopOptions {
    pub fn from_settings(settings: &TelemetrySettings) -> Result<Self, ConfigError> {
        Ok(Self {
            interval: settings.interval(),
            settle: settings.settle(),
            perturbation_probability: settings.perturbation_probability,
            qos: qos_from_level(settings.qos)?,
        })
    }
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            settle: Duration::from_secs(2),
            perturbation_probability: 0.01,
            qos: QoS::AtLeastOnce,
        }
    }
}

/// Outcome of publishing one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub published: usize,
    pub failed: usize,
}

pub struct TelemetryLoop {
    topic: String,
    mode: Mode,
    sensors: Vec<Sensor>,
    options: LoopOptions,
    state: LoopState,
    ticks: u64,
}

impl TelemetryLoop {
    pub fn new(topic: impl Into<String>, mode: Mode, sensors: Vec<Sensor>, options: LoopOptions) -> Self {
        Self {
            topic: topic.into(),
            mode,
            sensors,
            options,
            state: LoopState::Connecting,
            ticks: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Connects, subscribes when the mode asks for it, then ticks until `shutdown`
    /// resolves. The transport is disconnected on every exit after a successful
    /// connect.
    pub async fn run<T, F>(&mut self, transport: &mut T, shutdown: F) -> Result<(), TelemetryError>
    where
        T: Transport + ?Sized,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        self.transition(LoopState::Connecting);
        if let Err(e) = transport.connect().await {
            self.transition(LoopState::Terminated);
            return Err(TelemetryError::Connect(e));
        }
        self.transition(LoopState::Connected);

        if self.mode.subscribes() {
            tracing::debug!("subscribe start");
            if let Err(e) = transport
                .subscribe(&self.topic, self.options.qos, Arc::new(log_incoming))
                .await
            {
                tracing::error!("Failed to subscribe to {}: {e}", self.topic);
            }
            self.transition(LoopState::Subscribed);
        }

        let result = self.run_ticks(&*transport, &mut shutdown).await;

        if let Err(e) = transport.disconnect().await {
            tracing::warn!("Failed to disconnect cleanly: {e}");
        }
        self.transition(LoopState::Terminated);

        if let Err(e) = &result {
            tracing::error!("Telemetry loop stopped: {e}");
        }

        result
    }

    async fn run_ticks<T, F>(
        &mut self,
        transport: &T,
        shutdown: &mut Pin<&mut F>,
    ) -> Result<(), TelemetryError>
    where
        T: Transport + ?Sized,
        F: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            _ = shutdown.as_mut() => {
                tracing::info!("Interrupted before the first tick, shutting down");
                return Ok(());
            }
            _ = time::sleep(self.options.settle) => {}
        }

        self.transition(LoopState::Running);
        tracing::debug!("publish start");

        let mut interval = time::interval(self.options.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.as_mut() => {
                    tracing::info!("Interrupt received after {} ticks, shutting down", self.ticks);
                    return Ok(());
                }
                _ = interval.tick() => {
                    if self.mode.publishes() {
                        self.publish_tick(transport, now_millis()).await?;
                    }
                    self.ticks += 1;
                }
            }
        }
    }

    /// Publishes one reading per sensor, all stamped with `timestamp`. A failed
    /// publish is logged and the remaining sensors are still attempted.
    pub async fn publish_tick<T>(&mut self, transport: &T, timestamp: i64) -> Result<TickReport, TelemetryError>
    where
        T: Transport + ?Sized,
    {
        let mut report = TickReport::default();

        for sensor in self.sensors.iter_mut() {
            let message = TelemetryMessage {
                device: sensor.name().to_string(),
                value: sensor.next_value(self.options.perturbation_probability),
                timestamp,
            };
            let json = message.to_json()?;

            match transport
                .publish(&self.topic, json.as_bytes().to_vec(), self.options.qos)
                .await
            {
                Ok(()) => {
                    report.published += 1;
                    if self.mode == Mode::Publish {
                        tracing::info!("Published topic {}: {}", self.topic, json);
                    } else {
                        tracing::debug!("Published topic {}: {}", self.topic, json);
                    }
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::error!("Failed to publish {} to {}: {e}", message.device, self.topic);
                }
            }
        }

        Ok(report)
    }

    fn transition(&mut self, next: LoopState) {
        tracing::debug!("Telemetry loop {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

fn log_incoming(message: IncomingMessage) {
    tracing::info!(
        "Received a new message: {} from topic: {}",
        String::from_utf8_lossy(&message.payload),
        message.topic
    );
}
