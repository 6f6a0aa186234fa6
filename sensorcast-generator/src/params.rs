use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ParamsError {
    #[error("AR coefficient phi must lie in (-1, 1), got {0}")]
    NonStationary(f64),

    #[error("MA coefficient theta must lie in (-1, 1), got {0}")]
    NonInvertible(f64),

    #[error("innovation sigma must be finite and positive, got {0}")]
    InvalidSigma(f64),

    #[error("shock scale must be finite and non-negative, got {0}")]
    InvalidShockScale(f64),

    #[error("invalid noise distribution: {0}")]
    Distribution(#[from] rand_distr::NormalError),
}

/// Coefficients of the ARIMA(1,1,1) process driving every virtual sensor.
///
/// The first difference of the series follows
/// `d(t) = phi * d(t-1) + e(t) - theta * e(t-1)` with `e ~ N(0, sigma)`,
/// and an extra `N(0, shock_scale)` term on perturbed steps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArimaParams {
    pub phi: f64,
    pub theta: f64,
    pub sigma: f64,
    pub shock_scale: f64,
}

impl ArimaParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        if !self.phi.is_finite() || self.phi.abs() >= 1.0 {
            return Err(ParamsError::NonStationary(self.phi));
        }
        if !self.theta.is_finite() || self.theta.abs() >= 1.0 {
            return Err(ParamsError::NonInvertible(self.theta));
        }
        if !self.sigma.is_finite() || self.sigma <= 0.0 {
            return Err(ParamsError::InvalidSigma(self.sigma));
        }
        if !self.shock_scale.is_finite() || self.shock_scale < 0.0 {
            return Err(ParamsError::InvalidShockScale(self.shock_scale));
        }

        Ok(())
    }
}

impl Default for ArimaParams {
    fn default() -> Self {
        Self {
            phi: 0.5,
            theta: 0.4,
            sigma: 1.0,
            shock_scale: 10.0,
        }
    }
}
