//! # Per-bin radial model
//!
//! The crossing radii `y` of a bin are modeled as a linear function of the
//! elevation `x` with truncated-normal residuals:
//!
//! ```text
//! y_i ~ TruncNormal(mu = slope · x_i + intercept, sigma, lower, upper)
//! intercept ~ U(30, 180)    sigma ~ U(0, 50)    slope = 0 | U(-0.5, 0.5)
//! ```
//!
//! where `[lower, upper]` is the physically reachable range of the bin. The
//! posterior of the intercept is sampled by [`truncated::fit_truncated_normal`] and
//! smoothed on the radial grid by [`kde::GaussianKde`].
use std::fmt;

use statrs::statistics::Statistics;

pub mod kde;
pub mod truncated;

pub use kde::GaussianKde;
pub use truncated::fit_truncated_normal;

/// Prior on the slope of the radius–elevation relation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SlopePrior {
    /// Slope held at a constant value.
    Fixed(f64),
    /// Slope sampled with a uniform prior on `[low, high)`.
    Uniform { low: f64, high: f64 },
}

impl Default for SlopePrior {
    fn default() -> Self {
        SlopePrior::Fixed(0.0)
    }
}

/// Priors and tuning of the Metropolis sampler.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerParams {
    /// Number of independent chains.
    pub chains: usize,
    /// Adaptation draws discarded at the start of each chain.
    pub tune: usize,
    /// Draws kept per chain.
    pub draws: usize,
    /// Uniform prior of the intercept `(low, high)`, R_J.
    pub intercept_prior: (f64, f64),
    /// Uniform prior of sigma `(low, high)`, R_J.
    pub sigma_prior: (f64, f64),
    pub slope_prior: SlopePrior,
    /// Acceptance rate the proposal scales are tuned toward.
    pub target_accept: f64,
    /// Initial proposal standard deviations `(intercept, sigma, slope)`.
    pub initial_scales: (f64, f64, f64),
    /// Seed of the random generator driving the whole analysis.
    pub seed: u64,
}

impl Default for SamplerParams {
    fn default() -> Self {
        SamplerParams {
            chains: 4,
            tune: 1000,
            draws: 1000,
            intercept_prior: (30.0, 180.0),
            sigma_prior: (0.0, 50.0),
            slope_prior: SlopePrior::default(),
            target_accept: 0.3,
            initial_scales: (5.0, 2.0, 0.05),
            seed: 42,
        }
    }
}

/// Posterior samples of one bin, all chains concatenated in chain order.
#[derive(Debug, Clone, PartialEq)]
pub struct FitResult {
    pub intercept: Vec<f64>,
    pub sigma: Vec<f64>,
    /// Empty when the slope is fixed.
    pub slope: Vec<f64>,
    /// Acceptance rate of each chain after tuning.
    pub acceptance: Vec<f64>,
    /// Gelman–Rubin statistic of the intercept, `None` with a single chain.
    pub r_hat: Option<f64>,
}

impl FitResult {
    pub fn n_samples(&self) -> usize {
        self.intercept.len()
    }

    pub fn intercept_mean(&self) -> f64 {
        self.intercept.iter().mean()
    }

    pub fn sigma_mean(&self) -> f64 {
        self.sigma.iter().mean()
    }
}

impl fmt::Display for FitResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "intercept = {:.2} R_J, sigma = {:.2} R_J, {} samples",
            self.intercept_mean(),
            self.sigma_mean(),
            self.n_samples()
        )?;
        if let Some(r_hat) = self.r_hat {
            write!(f, ", R-hat = {r_hat:.3}")?;
        }
        Ok(())
    }
}
