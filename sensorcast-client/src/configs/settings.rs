use std::env;
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use sensorcast_generator::ArimaParams;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

const DEFAULT_SETTINGS: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../",
    "configs/default.toml"
));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
    pub directory: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Telemetry {
    pub interval_ms: u64,
    pub settle_ms: u64,
    pub perturbation_probability: f64,
    pub qos: u8,
}

impl Telemetry {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Backoff {
    pub min_secs: u64,
    pub max_secs: u64,
    /// A connection that stays up this long resets the backoff to `min_secs`.
    pub stable_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transport {
    pub keep_alive_secs: u64,
    pub connect_timeout_secs: u64,
    pub operation_timeout_secs: u64,
    pub max_queued_messages: usize,
    pub draining_frequency_hz: f64,
    pub backoff: Backoff,
}

impl Transport {
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }

    /// Delay between queued publishes drained after a reconnect.
    pub fn draining_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.draining_frequency_hz)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generator {
    pub phi: f64,
    pub theta: f64,
    pub sigma: f64,
    pub shock_scale: f64,
    pub seed: Option<u64>,
}

impl Generator {
    pub fn params(&self) -> ArimaParams {
        ArimaParams {
            phi: self.phi,
            theta: self.theta,
            sigma: self.sigma,
            shock_scale: self.shock_scale,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub logger: Logger,
    pub telemetry: Telemetry,
    pub transport: Transport,
    pub generator: Generator,
}

impl Settings {
    /// Layers the bundled defaults, `configs/<RUN_MODE>` and `SENSORCAST__*`
    /// environment variables.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or("development".into());

        let settings: Settings = Config::builder()
            .add_source(File::from_str(DEFAULT_SETTINGS, FileFormat::Toml))
            .add_source(File::with_name(&format!("configs/{run_mode}")).required(false))
            .add_source(
                Environment::with_prefix("SENSORCAST")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;

        Ok(settings)
    }

    /// The bundled defaults alone.
    pub fn defaults() -> Result<Self, ConfigError> {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(DEFAULT_SETTINGS, FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        settings.validate()?;

        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: &str| Err(ConfigError::InvalidSetting(message.to_string()));

        if self.telemetry.interval_ms == 0 {
            return invalid("telemetry.interval_ms must be positive");
        }
        if !(0.0..=1.0).contains(&self.telemetry.perturbation_probability) {
            return invalid("telemetry.perturbation_probability must lie in [0, 1]");
        }
        if self.telemetry.qos > 2 {
            return Err(ConfigError::InvalidQos(self.telemetry.qos));
        }

        let transport = &self.transport;
        if transport.keep_alive_secs < 5 {
            return invalid("transport.keep_alive_secs must be at least 5");
        }
        if transport.connect_timeout_secs == 0 || transport.operation_timeout_secs == 0 {
            return invalid("transport timeouts must be positive");
        }
        if transport.max_queued_messages == 0 {
            return invalid("transport.max_queued_messages must be positive");
        }
        if !transport.draining_frequency_hz.is_finite() || transport.draining_frequency_hz <= 0.0 {
            return invalid("transport.draining_frequency_hz must be positive");
        }
        if transport.backoff.min_secs == 0 || transport.backoff.min_secs > transport.backoff.max_secs {
            return invalid("transport.backoff requires 0 < min_secs <= max_secs");
        }

        self.generator.params().validate()?;

        Ok(())
    }
}
