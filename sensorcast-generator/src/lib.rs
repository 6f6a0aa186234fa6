pub mod arima;
pub mod params;

pub use arima::{clamp_probability, Arima111};
pub use params::{ArimaParams, ParamsError};

/// An infinite, non-restartable stream of sensor readings.
pub trait SignalSource: Send {
    /// Advances the series by one step. `perturbation_probability` is the chance
    /// that this step carries an anomalous shock.
    fn next_value(&mut self, perturbation_probability: f64) -> f64;
}
