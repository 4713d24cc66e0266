//! # Spatial binning in (elevation, azimuth)
//!
//! The elevation axis `ell` is cut into fixed-width intervals and the azimuth `phi`
//! into the dusk `[-π, 0)` and dawn `[0, π)` hemispheres. Every interval is
//! half-open, `lo <= v < hi`, so the bins tile the domain with no gap and no
//! overlap; points outside the domain fall in no bin.
//!
//! Bins are ordered elevation-major, azimuth-minor: `(ell #0, phi #0)`,
//! `(ell #0, phi #1)`, `(ell #1, phi #0)`, ...
//!
//! ## See also
//! ------------
//! * [`crate::bounds`] – Physical radial bounds derived from the ephemeris of a bin.
//! * [`crate::export`] – Assembly of the per-bin densities into the probability map.
use std::fmt;

use itertools::iproduct;

use crate::{
    boundary_errors::BoundaryError,
    bounds::PhysicalBounds,
    coordinates::CylindricalSolar,
    crossings::CrossingRecord,
    ephemeris::EphemerisSample,
    fit::FitResult,
};

/// Position of a bin in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BinIndex {
    pub ell: usize,
    pub phi: usize,
}

impl fmt::Display for BinIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(ell #{}, phi #{})", self.ell, self.phi)
    }
}

/// Half-open intervals `[lo, hi)` along one axis.
#[derive(Debug, Clone, PartialEq)]
pub struct BinEdges {
    bounds: Vec<(f64, f64)>,
}

impl BinEdges {
    /// Intervals `[left + k·step, left + (k + 1)·step)` for every `left + k·step < right`.
    ///
    /// The lower edges follow `numpy.arange(left, right, step)`, so the last interval
    /// may extend past `right` when the span is not a multiple of `step`.
    ///
    /// Return
    /// ----------
    /// * The edges, or [`BoundaryError::InvalidAnalysisParams`] for a non-finite,
    ///   empty, or negative layout.
    pub fn regular(left: f64, right: f64, step: f64) -> Result<Self, BoundaryError> {
        if !(left.is_finite() && right.is_finite() && step.is_finite()) || step <= 0.0 || right <= left
        {
            return Err(BoundaryError::InvalidAnalysisParams(format!(
                "invalid bin layout: left = {left}, right = {right}, step = {step}"
            )));
        }

        let count = ((right - left) / step).ceil() as usize;
        let bounds = (0..count)
            .map(|k| {
                let lo = left + k as f64 * step;
                (lo, lo + step)
            })
            .collect();
        Ok(BinEdges { bounds })
    }

    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// `(lo, hi)` of interval `i`.
    pub fn bound(&self, i: usize) -> (f64, f64) {
        self.bounds[i]
    }

    /// Midpoint of interval `i`, the reference value written to the probability map.
    pub fn reference(&self, i: usize) -> f64 {
        let (lo, hi) = self.bounds[i];
        (lo + hi) / 2.0
    }

    /// Index of the interval containing `value`.
    pub fn locate(&self, value: f64) -> Option<usize> {
        self.bounds
            .iter()
            .position(|&(lo, hi)| lo <= value && value < hi)
    }
}

/// A rectangle of the (elevation, azimuth) grid and everything measured inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialBin {
    pub index: BinIndex,
    pub ell_bound: (f64, f64),
    pub phi_bound: (f64, f64),
    pub crossings: Vec<CrossingRecord>,
    pub ephemeris: Vec<EphemerisSample>,
    /// Reachable radial range, set once the bin has been assessed.
    pub bounds: Option<PhysicalBounds>,
    /// Posterior of the truncated-normal fit, `None` for bins without crossings.
    pub fit: Option<FitResult>,
    /// Density of the intercept on the radial grid.
    pub density: Vec<f64>,
}

impl SpatialBin {
    fn new(index: BinIndex, ell_bound: (f64, f64), phi_bound: (f64, f64)) -> Self {
        SpatialBin {
            index,
            ell_bound,
            phi_bound,
            crossings: Vec::new(),
            ephemeris: Vec::new(),
            bounds: None,
            fit: None,
            density: Vec::new(),
        }
    }

    pub fn ell_ref(&self) -> f64 {
        (self.ell_bound.0 + self.ell_bound.1) / 2.0
    }

    pub fn phi_ref(&self) -> f64 {
        (self.phi_bound.0 + self.phi_bound.1) / 2.0
    }

    /// Number of crossings in the bin.
    pub fn number(&self) -> usize {
        self.crossings.len()
    }

    /// Number of hourly ephemeris samples in the bin, i.e. hours spent in it.
    pub fn time_in_bin(&self) -> usize {
        self.ephemeris.len()
    }

    pub fn crossing_rhos(&self) -> Vec<f64> {
        self.crossings.iter().map(|c| c.coordinates.rho).collect()
    }

    pub fn crossing_ells(&self) -> Vec<f64> {
        self.crossings.iter().map(|c| c.coordinates.ell).collect()
    }

    pub fn ephemeris_rhos(&self) -> Vec<f64> {
        self.ephemeris.iter().map(|s| s.coordinates.rho).collect()
    }
}

/// Cartesian product of elevation and azimuth intervals.
#[derive(Debug, Clone, PartialEq)]
pub struct BinGrid {
    pub ell: BinEdges,
    pub phi: BinEdges,
}

impl BinGrid {
    pub fn new(ell: BinEdges, phi: BinEdges) -> Self {
        BinGrid { ell, phi }
    }

    pub fn n_ell(&self) -> usize {
        self.ell.len()
    }

    pub fn n_phi(&self) -> usize {
        self.phi.len()
    }

    /// Total number of bins.
    pub fn len(&self) -> usize {
        self.n_ell() * self.n_phi()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bin containing `point`, if any.
    pub fn locate(&self, point: &CylindricalSolar) -> Option<BinIndex> {
        Some(BinIndex {
            ell: self.ell.locate(point.ell)?,
            phi: self.phi.locate(point.phi)?,
        })
    }

    /// Position of a bin in the elevation-major order.
    pub fn flat_index(&self, index: BinIndex) -> usize {
        index.ell * self.n_phi() + index.phi
    }

    /// Split crossings and ephemeris samples among the bins.
    ///
    /// Arguments
    /// -----------------
    /// * `crossings`: crossings with their cylindrical-solar coordinates.
    /// * `ephemeris`: hourly spacecraft samples.
    ///
    /// Return
    /// ----------
    /// * One [`SpatialBin`] per grid cell, elevation-major, empty cells included.
    ///   Points outside the grid are dropped.
    pub fn partition(
        &self,
        crossings: &[CrossingRecord],
        ephemeris: &[EphemerisSample],
    ) -> Vec<SpatialBin> {
        let mut bins: Vec<SpatialBin> = iproduct!(0..self.n_ell(), 0..self.n_phi())
            .map(|(ell, phi)| {
                SpatialBin::new(BinIndex { ell, phi }, self.ell.bound(ell), self.phi.bound(phi))
            })
            .collect();

        for crossing in crossings {
            if let Some(index) = self.locate(&crossing.coordinates) {
                bins[self.flat_index(index)].crossings.push(crossing.clone());
            }
        }
        for sample in ephemeris {
            if let Some(index) = self.locate(&sample.coordinates) {
                bins[self.flat_index(index)].ephemeris.push(*sample);
            }
        }
        bins
    }
}
