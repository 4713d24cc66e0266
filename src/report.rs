//! Fixed-width text summaries of the analyzed bins.
//!
//! Each [`BinSummary`] renders the counts, the reachable range, the posterior
//! estimates and a normalized histogram of the crossing radii in 10 R_J classes
//! from 50 to 190 R_J, drawn as bars of `#`.
use std::fmt;

use crate::{
    binning::{BinIndex, SpatialBin},
    bounds::{BoundStatus, PhysicalBounds},
};

const HISTOGRAM_START: f64 = 50.0;
const HISTOGRAM_WIDTH: f64 = 10.0;
const HISTOGRAM_CLASSES: usize = 14;
const BAR_WIDTH: usize = 40;

/// Normalized histogram on `[50, 60), [60, 70), ..., [180, 190]`.
///
/// Values outside the classes are ignored; the result integrates to one over the
/// classes (all zeros without values inside). The last class includes its right edge.
pub fn radius_histogram(values: &[f64]) -> Vec<f64> {
    let stop = HISTOGRAM_START + HISTOGRAM_WIDTH * HISTOGRAM_CLASSES as f64;
    let mut counts = vec![0usize; HISTOGRAM_CLASSES];
    for &v in values {
        if !(HISTOGRAM_START..=stop).contains(&v) {
            continue;
        }
        let k = (((v - HISTOGRAM_START) / HISTOGRAM_WIDTH) as usize).min(HISTOGRAM_CLASSES - 1);
        counts[k] += 1;
    }

    let total: usize = counts.iter().sum();
    if total == 0 {
        return vec![0.0; HISTOGRAM_CLASSES];
    }
    counts
        .iter()
        .map(|&c| c as f64 / (total as f64 * HISTOGRAM_WIDTH))
        .collect()
}

/// Everything worth printing about one bin after the analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct BinSummary {
    pub index: BinIndex,
    pub ell_bound: (f64, f64),
    pub phi_bound: (f64, f64),
    pub time_in_bin: usize,
    pub number: usize,
    pub bounds: Option<PhysicalBounds>,
    pub intercept_mean: Option<f64>,
    pub sigma_mean: Option<f64>,
    pub r_hat: Option<f64>,
    pub histogram: Vec<f64>,
}

impl From<&SpatialBin> for BinSummary {
    fn from(bin: &SpatialBin) -> Self {
        BinSummary {
            index: bin.index,
            ell_bound: bin.ell_bound,
            phi_bound: bin.phi_bound,
            time_in_bin: bin.time_in_bin(),
            number: bin.number(),
            bounds: bin.bounds,
            intercept_mean: bin.fit.as_ref().map(|f| f.intercept_mean()),
            sigma_mean: bin.fit.as_ref().map(|f| f.sigma_mean()),
            r_hat: bin.fit.as_ref().and_then(|f| f.r_hat),
            histogram: radius_histogram(&bin.crossing_rhos()),
        }
    }
}

impl fmt::Display for BinSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hemisphere = if self.phi_bound.0 >= 0.0 { "dawn" } else { "dusk" };
        writeln!(
            f,
            "Bin {:<18} ell [{:>7.1}, {:>7.1}) R_J  {hemisphere}",
            self.index.to_string(),
            self.ell_bound.0,
            self.ell_bound.1
        )?;
        writeln!(f, "  {:<16}{:>10}", "time_in_bin [h]", self.time_in_bin)?;
        writeln!(f, "  {:<16}{:>10}", "number", self.number)?;

        match &self.bounds {
            Some(bounds) => {
                let status = match bounds.status {
                    BoundStatus::Consistent => "consistent".to_string(),
                    BoundStatus::Tolerated { excess_km, .. } => format!("tolerated ({excess_km:.1} km)"),
                    BoundStatus::Violated { excess_km, .. } => format!("VIOLATED ({excess_km:.1} km)"),
                    BoundStatus::Unreachable => "UNREACHABLE".to_string(),
                };
                writeln!(
                    f,
                    "  {:<16}[{:>8.3}, {:>8.3}] R_J  {status}",
                    "bounds", bounds.lower, bounds.upper
                )?;
            }
            None => writeln!(f, "  {:<16}{:>10}", "bounds", "-")?,
        }

        if let (Some(intercept), Some(sigma)) = (self.intercept_mean, self.sigma_mean) {
            writeln!(f, "  {:<16}{:>10.3} R_J", "intercept", intercept)?;
            writeln!(f, "  {:<16}{:>10.3} R_J", "sigma", sigma)?;
            if let Some(r_hat) = self.r_hat {
                writeln!(f, "  {:<16}{:>10.3}", "R-hat", r_hat)?;
            }
        }

        if self.number > 0 {
            let peak = self.histogram.iter().copied().fold(0.0, f64::max);
            for (k, &value) in self.histogram.iter().enumerate() {
                let lo = HISTOGRAM_START + HISTOGRAM_WIDTH * k as f64;
                let bar = if peak > 0.0 {
                    ((value / peak) * BAR_WIDTH as f64).round() as usize
                } else {
                    0
                };
                writeln!(
                    f,
                    "  [{:>5.0}, {:>5.0}) {:>8.4} {}",
                    lo,
                    lo + HISTOGRAM_WIDTH,
                    value,
                    "#".repeat(bar)
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test_report {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_histogram_normalization() {
        let hist = radius_histogram(&[55.0, 57.0, 61.0, 190.0, 20.0, 250.0]);
        assert_eq!(hist.len(), 14);
        assert_relative_eq!(hist[0], 2.0 / 40.0);
        assert_relative_eq!(hist[1], 1.0 / 40.0);
        assert_relative_eq!(hist[13], 1.0 / 40.0);
        assert_relative_eq!(hist.iter().sum::<f64>() * 10.0, 1.0, epsilon = 1e-12);
        assert_eq!(radius_histogram(&[]), vec![0.0; 14]);
    }

    #[test]
    fn test_display() {
        let summary = BinSummary {
            index: BinIndex { ell: 2, phi: 1 },
            ell_bound: (-100.0, -90.0),
            phi_bound: (0.0, std::f64::consts::PI),
            time_in_bin: 42,
            number: 2,
            bounds: Some(PhysicalBounds {
                lower: 60.0,
                upper: 95.0,
                status: BoundStatus::Consistent,
            }),
            intercept_mean: Some(80.5),
            sigma_mean: Some(4.25),
            r_hat: Some(1.001),
            histogram: radius_histogram(&[75.0, 85.0]),
        };
        let text = summary.to_string();
        assert!(text.contains("(ell #2, phi #1)"));
        assert!(text.contains("dawn"));
        assert!(text.contains("time_in_bin [h]         42"));
        assert!(text.contains("consistent"));
        assert!(text.contains("80.500 R_J"));
        assert!(text.contains("[   70,    80)   0.0500 ########################################"));
    }
}
