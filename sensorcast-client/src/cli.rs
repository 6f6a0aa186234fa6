use std::ffi::OsString;
use std::path::PathBuf;

use clap::{CommandFactory, Parser};

use crate::configs::{BrokerConfig, ClientConfig, Security};
use crate::errors::ConfigError;
use crate::telemetry::Mode;
use crate::transport::{ConnectionFactory, ProxyKind, ProxySettings, PROXY_TYPE_HTTP};

pub const DEFAULT_ROOT_CA: &str = "./cert/AmazonRootCA1.pem";
pub const DEFAULT_CERT: &str = "./cert/certificate.pem";
pub const DEFAULT_KEY: &str = "./cert/private.pem";

#[derive(Debug, Parser)]
#[command(name = "sensorcast")]
#[command(version)]
#[command(about = "Publish synthetic sensor telemetry to an MQTT broker and log what comes back")]
pub struct Cli {
    /// Your AWS IoT custom endpoint
    #[arg(short = 'e', long = "endpoint")]
    pub endpoint: String,

    /// Root CA file path
    #[arg(short = 'r', long = "rootCA", default_value = DEFAULT_ROOT_CA)]
    pub root_ca: PathBuf,

    /// Certificate file path [default without --websocket: ./cert/certificate.pem]
    #[arg(short = 'c', long = "cert")]
    pub cert: Option<PathBuf>,

    /// Private key file path [default without --websocket: ./cert/private.pem]
    #[arg(short = 'k', long = "key")]
    pub key: Option<PathBuf>,

    /// Port number override [default: 8883, or 443 with --websocket]
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Use MQTT over WebSocket
    #[arg(short = 'w', long = "websocket")]
    pub websocket: bool,

    /// Targeted client id (also accepted as -id)
    #[arg(long = "clientId", default_value = "basicPubSub")]
    pub client_id: String,

    /// Targeted topic
    #[arg(short = 't', long = "topic", default_value = "sdk/test/Python")]
    pub topic: String,

    /// Operation modes: ['both', 'publish', 'subscribe']
    #[arg(short = 'm', long = "mode", default_value = "both")]
    pub mode: String,

    /// Number of sensors
    #[arg(short = 's', long = "sensor", default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub sensors: u32,

    /// Use Proxy
    #[arg(long = "proxy")]
    pub proxy: bool,

    /// Proxy address
    #[arg(long = "proxyAddr")]
    pub proxy_addr: Option<String>,

    /// Proxy port
    #[arg(long = "proxyPort")]
    pub proxy_port: Option<u16>,

    /// Proxy type. Only 3 (HTTP) is accepted; 1 (SOCKS4) and 2 (SOCKS5) are rejected
    #[arg(long = "proxyType")]
    pub proxy_type: Option<u8>,
}

/// Rewrites the two-letter short flag `-id` (also `-id=X` and `-idX`) into
/// `--clientId`, which clap cannot express directly.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(Into::into)
        .flat_map(|arg: OsString| {
            let rewritten = match arg.to_str() {
                Some("-id") => vec![OsString::from("--clientId")],
                Some(s) if s.starts_with("-id=") => {
                    vec![OsString::from(format!("--clientId={}", &s["-id=".len()..]))]
                }
                Some(s) if s.starts_with("-id") => {
                    vec![OsString::from("--clientId"), OsString::from(&s["-id".len()..])]
                }
                _ => vec![arg],
            };
            rewritten.into_iter()
        })
        .collect()
}

/// Prints a usage error for `error` and exits with status 2.
pub fn exit_with_usage(error: ConfigError) -> ! {
    Cli::command().error(error.error_kind(), error).exit()
}

impl Cli {
    /// Validates the arguments before anything touches the network.
    pub fn into_config(self) -> Result<ClientConfig, ConfigError> {
        let mode: Mode = self.mode.parse()?;

        let security = if self.websocket {
            if self.cert.is_some() || self.key.is_some() {
                return Err(ConfigError::WebsocketWithCertificate);
            }
            Security::WebSocket {
                root_ca: self.root_ca,
            }
        } else {
            let cert = self.cert.unwrap_or_else(|| PathBuf::from(DEFAULT_CERT));
            let key = self.key.unwrap_or_else(|| PathBuf::from(DEFAULT_KEY));
            if cert.as_os_str().is_empty() || key.as_os_str().is_empty() {
                return Err(ConfigError::MissingCredentials);
            }
            Security::MutualTls {
                root_ca: self.root_ca,
                cert,
                key,
            }
        };

        let connection = if self.proxy {
            let address = self.proxy_addr.ok_or(ConfigError::MissingProxyAddress)?;
            let port = self.proxy_port.ok_or(ConfigError::MissingProxyPort)?;
            let kind = ProxyKind::from_code(self.proxy_type.unwrap_or(PROXY_TYPE_HTTP))?;
            ConnectionFactory::Proxied(ProxySettings { kind, address, port })
        } else {
            ConnectionFactory::Direct
        };

        // Port 0 counts as "not given"
        let port = self
            .port
            .filter(|port| *port != 0)
            .unwrap_or_else(|| security.default_port());

        Ok(ClientConfig {
            broker: BrokerConfig {
                endpoint: self.endpoint,
                port,
                client_id: self.client_id,
                security,
                connection,
            },
            topic: self.topic,
            mode,
            sensors: self.sensors as usize,
        })
    }
}
