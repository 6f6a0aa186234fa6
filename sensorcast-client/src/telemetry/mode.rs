use std::fmt;
use std::str::FromStr;

use crate::errors::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Both,
    Publish,
    Subscribe,
}

impl Mode {
    pub fn publishes(&self) -> bool {
        matches!(self, Mode::Both | Mode::Publish)
    }

    pub fn subscribes(&self) -> bool {
        matches!(self, Mode::Both | Mode::Subscribe)
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "both" => Ok(Mode::Both),
            "publish" => Ok(Mode::Publish),
            "subscribe" => Ok(Mode::Subscribe),
            other => Err(ConfigError::UnknownMode(other.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Both => write!(f, "both"),
            Mode::Publish => write!(f, "publish"),
            Mode::Subscribe => write!(f, "subscribe"),
        }
    }
}
