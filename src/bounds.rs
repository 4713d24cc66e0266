//! Physically reachable radial range of a bin.
//!
//! The truncation of the per-bin fit is the range of radii the spacecraft actually
//! sampled while inside the bin: the minimum and maximum `rho` of the hourly
//! ephemeris. Every crossing of the bin must lie inside that range. The hourly
//! cadence can miss the true extremum by a few tens of kilometers, so a crossing
//! that overshoots by less than the tolerance (50 km by default) stretches the
//! bound to its own radius. A larger overshoot is a violation: the crossing list or
//! the ephemeris is wrong for that bin and the bin needs inspection.
use log::warn;

use crate::{
    binning::BinIndex,
    boundary_errors::BoundaryError,
    constants::{JovianRadius, Kilometer, JUPITER_RADIUS_KM},
};

/// What to do when a bin violates its bounds or its fit fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundPolicy {
    /// Stop the analysis with an error naming the bin.
    #[default]
    Halt,
    /// Log a warning, record the bin in the report, and keep going.
    Flag,
}

/// Consistency between the crossings of a bin and its ephemeris range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundStatus {
    /// Every crossing lies inside the ephemeris range.
    Consistent,
    /// A crossing overshoots by less than the tolerance; the bound was stretched.
    Tolerated {
        crossing_rho: JovianRadius,
        excess_km: Kilometer,
    },
    /// A crossing overshoots by at least the tolerance.
    Violated {
        crossing_rho: JovianRadius,
        excess_km: Kilometer,
    },
    /// Crossings were recorded where the ephemeris never went.
    Unreachable,
}

impl BoundStatus {
    pub fn is_violation(&self) -> bool {
        matches!(self, BoundStatus::Violated { .. } | BoundStatus::Unreachable)
    }
}

/// Lower and upper truncation radii (R_J) of a bin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalBounds {
    pub lower: JovianRadius,
    pub upper: JovianRadius,
    pub status: BoundStatus,
}

/// Side of the range a crossing falls out of, with its radius and overshoot.
fn overshoot(lower: f64, upper: f64, crossing_min: f64, crossing_max: f64) -> Option<(f64, f64)> {
    let above = (crossing_max > upper).then(|| (crossing_max, (crossing_max - upper) * JUPITER_RADIUS_KM));
    let below = (crossing_min < lower).then(|| (crossing_min, (lower - crossing_min) * JUPITER_RADIUS_KM));
    match (above, below) {
        (Some(a), Some(b)) => Some(if a.1 >= b.1 { a } else { b }),
        (a, b) => a.or(b),
    }
}

impl PhysicalBounds {
    /// Bounds of a bin from the radii of its ephemeris samples and crossings.
    ///
    /// Arguments
    /// -----------------
    /// * `ephemeris_rhos`: `rho` of every ephemeris sample in the bin (R_J).
    /// * `crossing_rhos`: `rho` of every crossing in the bin (R_J).
    /// * `tolerance_km`: overshoot under which a crossing stretches the bound.
    ///
    /// Return
    /// ----------
    /// * `None` for a bin with neither samples nor crossings, otherwise the bounds and
    ///   their [`BoundStatus`]. An [`BoundStatus::Unreachable`] bin reports the crossing
    ///   range as its bounds.
    pub fn assess(ephemeris_rhos: &[f64], crossing_rhos: &[f64], tolerance_km: Kilometer) -> Option<Self> {
        let min_of = |values: &[f64]| values.iter().copied().fold(f64::INFINITY, f64::min);
        let max_of = |values: &[f64]| values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        if ephemeris_rhos.is_empty() {
            return (!crossing_rhos.is_empty()).then(|| PhysicalBounds {
                lower: min_of(crossing_rhos),
                upper: max_of(crossing_rhos),
                status: BoundStatus::Unreachable,
            });
        }

        let mut bounds = PhysicalBounds {
            lower: min_of(ephemeris_rhos),
            upper: max_of(ephemeris_rhos),
            status: BoundStatus::Consistent,
        };
        if crossing_rhos.is_empty() {
            return Some(bounds);
        }

        let (crossing_min, crossing_max) = (min_of(crossing_rhos), max_of(crossing_rhos));
        if let Some((crossing_rho, excess_km)) =
            overshoot(bounds.lower, bounds.upper, crossing_min, crossing_max)
        {
            if excess_km < tolerance_km {
                bounds.lower = bounds.lower.min(crossing_min);
                bounds.upper = bounds.upper.max(crossing_max);
                bounds.status = BoundStatus::Tolerated {
                    crossing_rho,
                    excess_km,
                };
            } else {
                bounds.status = BoundStatus::Violated {
                    crossing_rho,
                    excess_km,
                };
            }
        }
        Some(bounds)
    }

    /// Apply the bound policy to a bin.
    ///
    /// Arguments
    /// -----------------
    /// * `bin`: bin being assessed, for error messages.
    /// * `crossing_rhos`: radii of the crossings of the bin.
    /// * `policy`: [`BoundPolicy::Halt`] turns a violation into an error,
    ///   [`BoundPolicy::Flag`] widens the bounds to the crossings and reports the bin.
    ///
    /// Return
    /// ----------
    /// * `(bounds, flagged)`, or [`BoundaryError::BoundViolation`] /
    ///   [`BoundaryError::UnreachableBin`] under [`BoundPolicy::Halt`].
    pub fn enforce(
        self,
        bin: BinIndex,
        crossing_rhos: &[f64],
        policy: BoundPolicy,
    ) -> Result<(Self, bool), BoundaryError> {
        if !self.status.is_violation() {
            return Ok((self, false));
        }

        let error = match self.status {
            BoundStatus::Violated {
                crossing_rho,
                excess_km,
            } => BoundaryError::BoundViolation {
                bin,
                crossing_rho,
                lower: self.lower,
                upper: self.upper,
                excess_km,
            },
            _ => BoundaryError::UnreachableBin { bin },
        };

        match policy {
            BoundPolicy::Halt => Err(error),
            BoundPolicy::Flag => {
                warn!("{error}; bin flagged for inspection");
                let widened = PhysicalBounds {
                    lower: crossing_rhos.iter().copied().fold(self.lower, f64::min),
                    upper: crossing_rhos.iter().copied().fold(self.upper, f64::max),
                    status: self.status,
                };
                Ok((widened, true))
            }
        }
    }

    /// `true` if `rho` lies in `[lower, upper]`.
    pub fn contains(&self, rho: JovianRadius) -> bool {
        self.lower <= rho && rho <= self.upper
    }
}
