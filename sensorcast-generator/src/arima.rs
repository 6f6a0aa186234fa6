use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::params::{ArimaParams, ParamsError};
use crate::SignalSource;

/// Clamps a perturbation probability into `[0, 1]`. NaN counts as no perturbation.
pub fn clamp_probability(p: f64) -> f64 {
    if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) }
}

pub struct Arima111 {
    params: ArimaParams,
    innovation: Normal<f64>,
    shock: Normal<f64>,
    rng: StdRng,

    previous_value: f64,
    // Last first difference, feeds the AR term
    previous_difference: f64,
    // Last shock applied, feeds the MA term
    previous_innovation: f64,
}

impl Arima111 {
    /// Creates a generator seeded from the operating system.
    pub fn new(params: ArimaParams) -> Result<Self, ParamsError> {
        Self::with_rng(params, StdRng::from_os_rng())
    }

    /// Creates a reproducible generator: equal seeds fed equal probabilities
    /// yield equal sequences.
    pub fn seeded(params: ArimaParams, seed: u64) -> Result<Self, ParamsError> {
        Self::with_rng(params, StdRng::seed_from_u64(seed))
    }

    fn with_rng(params: ArimaParams, rng: StdRng) -> Result<Self, ParamsError> {
        params.validate()?;

        Ok(Self {
            params,
            innovation: Normal::new(0.0, params.sigma)?,
            shock: Normal::new(0.0, params.shock_scale)?,
            rng,
            previous_value: 0.0,
            previous_difference: 0.0,
            previous_innovation: 0.0,
        })
    }

    pub fn params(&self) -> &ArimaParams {
        &self.params
    }

    pub fn previous_value(&self) -> f64 {
        self.previous_value
    }

    pub fn previous_innovation(&self) -> f64 {
        self.previous_innovation
    }

    fn step(&mut self, perturbation_probability: f64) -> f64 {
        let p = clamp_probability(perturbation_probability);

        let mut e = self.innovation.sample(&mut self.rng);
        if self.rng.random_bool(p) {
            e += self.shock.sample(&mut self.rng);
        }

        // d(t) = phi * d(t-1) + e(t) - theta * e(t-1), x(t) = x(t-1) + d(t)
        let difference =
            self.params.phi * self.previous_difference + e - self.params.theta * self.previous_innovation;
        let value = self.previous_value + difference;

        self.previous_value = value;
        self.previous_difference = difference;
        self.previous_innovation = e;

        value
    }
}

impl SignalSource for Arima111 {
    fn next_value(&mut self, perturbation_probability: f64) -> f64 {
        self.step(perturbation_probability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn differences(generator: &mut Arima111, p: f64, steps: usize) -> Vec<f64> {
        let mut previous = generator.previous_value();
        (0..steps)
            .map(|_| {
                let value = generator.next_value(p);
                let difference = value - previous;
                previous = value;
                difference
            })
            .collect()
    }

    fn variance(xs: &[f64]) -> f64 {
        let mean = xs.iter().sum::<f64>() / xs.len() as f64;
        xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / xs.len() as f64
    }

    #[test]
    fn test_starts_from_zero_state() {
        let generator = Arima111::seeded(ArimaParams::default(), 7).unwrap();

        assert_eq!(generator.previous_value(), 0.0);
        assert_eq!(generator.previous_innovation(), 0.0);
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let probabilities = [0.0, 0.01, 0.5, 1.0, 0.01, 0.2, 0.0, 0.9];
        let mut left = Arima111::seeded(ArimaParams::default(), 42).unwrap();
        let mut right = Arima111::seeded(ArimaParams::default(), 42).unwrap();

        for _ in 0..100 {
            for p in probabilities {
                assert_eq!(left.next_value(p).to_bits(), right.next_value(p).to_bits());
            }
        }
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut left = Arima111::seeded(ArimaParams::default(), 1).unwrap();
        let mut right = Arima111::seeded(ArimaParams::default(), 2).unwrap();

        let left: Vec<f64> = (0..10).map(|_| left.next_value(0.01)).collect();
        let right: Vec<f64> = (0..10).map(|_| right.next_value(0.01)).collect();

        assert_ne!(left, right);
    }

    #[test]
    fn test_unperturbed_walk_has_bounded_steps() {
        let mut generator = Arima111::seeded(ArimaParams::default(), 2024).unwrap();
        let steps = differences(&mut generator, 0.0, 10_000);

        // Stationary variance of the differences is ~1.01 for the default coefficients
        assert!(variance(&steps) < 4.0, "variance {}", variance(&steps));
        assert!(steps.iter().all(|d| d.abs() < 10.0), "found a discontinuity");
    }

    #[test]
    fn test_perturbation_widens_steps() {
        let mut calm = Arima111::seeded(ArimaParams::default(), 99).unwrap();
        let mut noisy = Arima111::seeded(ArimaParams::default(), 99).unwrap();

        let calm = variance(&differences(&mut calm, 0.0, 5_000));
        let noisy = variance(&differences(&mut noisy, 1.0, 5_000));

        assert!(noisy > 25.0 * calm, "calm {calm}, noisy {noisy}");
    }

    #[test]
    fn test_zero_phi_reduces_to_moving_average_walk() {
        let params = ArimaParams { phi: 0.0, theta: 0.3, ..Default::default() };
        let mut generator = Arima111::seeded(params, 5).unwrap();

        for _ in 0..200 {
            let previous_value = generator.previous_value();
            let previous_innovation = generator.previous_innovation();

            let value = generator.next_value(0.01);
            let e = generator.previous_innovation();

            assert!((value - (previous_value + e - 0.3 * previous_innovation)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_out_of_range_probability_is_clamped() {
        let mut over = Arima111::seeded(ArimaParams::default(), 11).unwrap();
        let mut one = Arima111::seeded(ArimaParams::default(), 11).unwrap();
        let mut under = Arima111::seeded(ArimaParams::default(), 11).unwrap();
        let mut nan = Arima111::seeded(ArimaParams::default(), 11).unwrap();
        let mut zero = Arima111::seeded(ArimaParams::default(), 11).unwrap();

        for _ in 0..50 {
            assert_eq!(over.next_value(3.5), one.next_value(1.0));
            let expected = zero.next_value(0.0);
            assert_eq!(under.next_value(-0.2), expected);
        }
        for _ in 0..50 {
            assert!(nan.next_value(f64::NAN).is_finite());
        }
    }

    #[test]
    fn test_rejects_invalid_params() {
        let params = ArimaParams { theta: 1.0, ..Default::default() };
        assert!(Arima111::seeded(params, 0).is_err());
    }

    #[test]
    fn test_clamp_probability() {
        assert_eq!(clamp_probability(0.01), 0.01);
        assert_eq!(clamp_probability(-3.0), 0.0);
        assert_eq!(clamp_probability(7.0), 1.0);
        assert_eq!(clamp_probability(f64::NAN), 0.0);
    }
}
