use sensorcast_generator::{Arima111, ArimaParams, ParamsError, SignalSource};

/// `device1..deviceN`, in order.
pub fn sensor_names(count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("device{i}")).collect()
}

/// A named virtual sensor bound to its own generator.
pub struct Sensor {
    name: String,
    source: Box<dyn SignalSource>,
}

impl Sensor {
    pub fn new(name: impl Into<String>, source: Box<dyn SignalSource>) -> Self {
        Self {
            name: name.into(),
            source,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn next_value(&mut self, perturbation_probability: f64) -> f64 {
        self.source.next_value(perturbation_probability)
    }
}

/// Builds `count` sensors with independent generators. With a seed, sensor `i`
/// (zero-based) is seeded with `seed + i`.
pub fn build_sensors(
    count: usize,
    params: ArimaParams,
    seed: Option<u64>,
) -> Result<Vec<Sensor>, ParamsError> {
    sensor_names(count)
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            let generator = match seed {
                Some(seed) => Arima111::seeded(params, seed.wrapping_add(i as u64))?,
                None => Arima111::new(params)?,
            };
            Ok(Sensor::new(name, Box::new(generator)))
        })
        .collect()
}
