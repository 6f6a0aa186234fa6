use clap::error::ErrorKind;
use sensorcast_generator::ParamsError;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown --mode option {0}. Must be one of ['both', 'publish', 'subscribe']")]
    UnknownMode(String),

    #[error("X.509 cert authentication and WebSocket are mutual exclusive. Please pick one.")]
    WebsocketWithCertificate,

    #[error("Missing credentials for authentication.")]
    MissingCredentials,

    #[error("--proxy requires --proxyAddr")]
    MissingProxyAddress,

    #[error("--proxy requires --proxyPort")]
    MissingProxyPort,

    #[error("Proxy type {0} is not supported, only 3 (HTTP) is available")]
    UnsupportedProxyType(u8),

    #[error("QoS level must be 0, 1 or 2, got {0}")]
    InvalidQos(u8),

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    #[error("Invalid generator parameters: {0}")]
    Generator(#[from] ParamsError),

    #[error("Failed to load settings: {0}")]
    Load(#[from] ::config::ConfigError),
}

impl ConfigError {
    /// Kind reported by the usage message when the error comes from the command line.
    pub fn error_kind(&self) -> ErrorKind {
        match self {
            ConfigError::UnknownMode(_) => ErrorKind::InvalidValue,
            ConfigError::WebsocketWithCertificate => ErrorKind::ArgumentConflict,
            ConfigError::MissingCredentials => ErrorKind::MissingRequiredArgument,
            ConfigError::MissingProxyAddress => ErrorKind::MissingRequiredArgument,
            ConfigError::MissingProxyPort => ErrorKind::MissingRequiredArgument,
            ConfigError::UnsupportedProxyType(_) => ErrorKind::InvalidValue,
            ConfigError::InvalidQos(_) => ErrorKind::InvalidValue,
            ConfigError::InvalidSetting(_) => ErrorKind::InvalidValue,
            ConfigError::Generator(_) => ErrorKind::InvalidValue,
            ConfigError::Load(_) => ErrorKind::Io,
        }
    }
}
