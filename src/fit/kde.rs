//! One-dimensional Gaussian kernel density estimate.
//!
//! The density at `r` is the mean of Gaussian kernels of width `h` centered on the
//! samples, so it integrates to one over the real line:
//!
//! ```text
//! f(r) = 1 / (n h √(2π)) · Σ exp(-(r - s_i)² / (2 h²))
//! ```
use std::f64::consts::PI;

use crate::boundary_errors::BoundaryError;

#[derive(Debug, Clone, PartialEq)]
pub struct GaussianKde {
    samples: Vec<f64>,
    bandwidth: f64,
}

impl GaussianKde {
    /// Build the estimator.
    ///
    /// Arguments
    /// -----------------
    /// * `samples`: points the kernels are centered on. May be empty.
    /// * `bandwidth`: kernel standard deviation, strictly positive.
    pub fn new(samples: &[f64], bandwidth: f64) -> Result<Self, BoundaryError> {
        if !(bandwidth > 0.0 && bandwidth.is_finite()) {
            return Err(BoundaryError::InvalidAnalysisParams(format!(
                "KDE bandwidth must be positive (got {bandwidth})"
            )));
        }
        Ok(GaussianKde {
            samples: samples.to_vec(),
            bandwidth,
        })
    }

    /// Density at each point of `grid`; all zeros without samples.
    pub fn evaluate(&self, grid: &[f64]) -> Vec<f64> {
        if self.samples.is_empty() {
            return vec![0.0; grid.len()];
        }

        let norm = 1.0 / (self.samples.len() as f64 * self.bandwidth * (2.0 * PI).sqrt());
        let inv_two_h2 = 1.0 / (2.0 * self.bandwidth * self.bandwidth);
        grid.iter()
            .map(|&r| {
                norm * self
                    .samples
                    .iter()
                    .map(|&s| (-(r - s) * (r - s) * inv_two_h2).exp())
                    .sum::<f64>()
            })
            .collect()
    }
}
