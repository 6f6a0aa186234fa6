use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// One reading of one virtual sensor, as published on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryMessage {
    pub device: String,
    pub value: f64,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl TelemetryMessage {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

pub fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
