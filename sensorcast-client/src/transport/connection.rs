use std::fmt;

use rumqttc::{MqttOptions, Proxy, ProxyAuth, ProxyType};

use crate::errors::ConfigError;

/// Proxy numbering accepted on the command line (PySocks convention).
pub const PROXY_TYPE_SOCKS5: u8 = 2;
pub const PROXY_TYPE_HTTP: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyKind {
    Http,
}

impl ProxyKind {
    pub fn from_code(code: u8) -> Result<Self, ConfigError> {
        match code {
            PROXY_TYPE_HTTP => Ok(ProxyKind::Http),
            other => Err(ConfigError::UnsupportedProxyType(other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxySettings {
    pub kind: ProxyKind,
    pub address: String,
    pub port: u16,
}

/// How the socket to the broker is opened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConnectionFactory {
    #[default]
    Direct,
    Proxied(ProxySettings),
}

impl ConnectionFactory {
    pub fn apply(&self, options: &mut MqttOptions) {
        match self {
            ConnectionFactory::Direct => {}
            ConnectionFactory::Proxied(proxy) => {
                let ty = match proxy.kind {
                    ProxyKind::Http => ProxyType::Http,
                };

                options.set_proxy(Proxy {
                    ty,
                    auth: ProxyAuth::None,
                    addr: proxy.address.clone(),
                    port: proxy.port,
                });
            }
        }
    }
}

impl fmt::Display for ConnectionFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionFactory::Direct => write!(f, "direct"),
            ConnectionFactory::Proxied(proxy) => {
                write!(f, "{:?} proxy {}:{}", proxy.kind, proxy.address, proxy.port)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_codes() {
        assert_eq!(ProxyKind::from_code(PROXY_TYPE_HTTP).unwrap(), ProxyKind::Http);
        assert!(matches!(
            ProxyKind::from_code(PROXY_TYPE_SOCKS5),
            Err(ConfigError::UnsupportedProxyType(2))
        ));
        assert!(ProxyKind::from_code(9).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(ConnectionFactory::Direct.to_string(), "direct");

        let proxied = ConnectionFactory::Proxied(ProxySettings {
            kind: ProxyKind::Http,
            address: "10.0.0.1".to_string(),
            port: 3128,
        });
        assert_eq!(proxied.to_string(), "Http proxy 10.0.0.1:3128");
    }
}
