mod message;
mod mode;
mod runner;
mod sensor;

pub use message::{now_millis, TelemetryMessage};
pub use mode::Mode;
pub use runner::{LoopOptions, LoopState, TelemetryLoop, TickReport};
pub use sensor::{build_sensors, sensor_names, Sensor};
