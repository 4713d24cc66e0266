//! Radial abscissa on which every bin density is evaluated.
use crate::{
    boundary_errors::BoundaryError,
    constants::{JovianRadius, RHO_GRID_POINTS, RHO_GRID_START, RHO_GRID_STOP},
};

#[derive(Debug, Clone, PartialEq)]
pub struct RadialGrid {
    points: Vec<JovianRadius>,
}

impl RadialGrid {
    /// `n` evenly spaced radii from `start` to `stop`, both included.
    pub fn linspace(start: f64, stop: f64, n: usize) -> Result<Self, BoundaryError> {
        if n < 2 || !(start.is_finite() && stop.is_finite()) || stop <= start {
            return Err(BoundaryError::InvalidAnalysisParams(format!(
                "invalid radial grid: {n} points from {start} to {stop}"
            )));
        }
        Ok(RadialGrid {
            points: evenly_spaced(start, stop, n),
        })
    }

    pub fn points(&self) -> &[JovianRadius] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Density of a bin without crossings.
    pub fn zero_density(&self) -> Vec<f64> {
        vec![0.0; self.points.len()]
    }
}

impl Default for RadialGrid {
    /// 100 radii from 50 to 200 R_J.
    fn default() -> Self {
        RadialGrid {
            points: evenly_spaced(RHO_GRID_START, RHO_GRID_STOP, RHO_GRID_POINTS),
        }
    }
}

/// `n >= 2` points from `start` to `stop`, the last one exactly `stop`.
fn evenly_spaced(start: f64, stop: f64, n: usize) -> Vec<JovianRadius> {
    let step = (stop - start) / (n - 1) as f64;
    (0..n)
        .map(|i| if i + 1 == n { stop } else { start + step * i as f64 })
        .collect()
}

#[cfg(test)]
mod test_grid {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_grid() {
        let grid = RadialGrid::default();
        assert_eq!(grid.len(), 100);
        assert_eq!(grid.points()[0], 50.0);
        assert_eq!(grid.points()[99], 200.0);
        assert_relative_eq!(grid.points()[1], 50.0 + 150.0 / 99.0, epsilon = 1e-12);
        assert_eq!(grid, RadialGrid::linspace(50.0, 200.0, 100).unwrap());
    }

    #[test]
    fn test_evenly_spaced_endpoints() {
        assert_eq!(evenly_spaced(0.0, 1.0, 2), vec![0.0, 1.0]);
        let points = evenly_spaced(0.1, 0.7, 7);
        assert_eq!(points.len(), 7);
        assert_eq!(points[0], 0.1);
        assert_eq!(points[6], 0.7);
        assert_relative_eq!(points[3], 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_density() {
        let density = RadialGrid::default().zero_density();
        assert_eq!(density.len(), 100);
        assert!(density.iter().all(|&d| d == 0.0));
    }

    #[test]
    fn test_invalid_grid() {
        assert!(RadialGrid::linspace(50.0, 200.0, 1).is_err());
        assert!(RadialGrid::linspace(200.0, 50.0, 10).is_err());
    }
}
