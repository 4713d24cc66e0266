//! # Cylindrical-solar coordinates
//!
//! Conversion between Cartesian JSS positions and the cylindrical system aligned with
//! the Sun–Jupiter line used to bin boundary crossings.
//!
//! ## Convention
//! -----------------
//! With `x` pointing to the Sun, `z` to Jupiter's north, and `y` completing the
//! right-handed set (dusk):
//!
//! ```text
//! ell = x                      (elevation along the Sun–planet line, + sunward)
//! rho = sqrt(y² + z²)          (distance from the Sun–planet line)
//! phi = atan2(-y, z)           (azimuth about the line, 0 = north, + toward dawn)
//! ```
//!
//! `phi` is normalized into `[-π, π)` so that the dusk `[-π, 0)` and dawn `[0, π)`
//! hemispheres tile the circle exactly.
use std::f64::consts::PI;

use nalgebra::Vector3;

use crate::{
    boundary_errors::BoundaryError,
    constants::{JovianRadius, Radian},
};

/// A point in cylindrical-solar coordinates (lengths in R_J, angle in radians).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CylindricalSolar {
    pub rho: JovianRadius,
    pub phi: Radian,
    pub ell: JovianRadius,
}

impl CylindricalSolar {
    /// Convert a Cartesian JSS position into cylindrical-solar coordinates.
    ///
    /// Arguments
    /// -----------------
    /// * `position`: Cartesian position `(x, y, z)` in R_J.
    ///
    /// Return
    /// ----------
    /// * The converted point, or [`BoundaryError::NonFiniteCoordinate`] if any component
    ///   is NaN or infinite.
    pub fn from_cartesian(position: &Vector3<f64>) -> Result<Self, BoundaryError> {
        let (x, y, z) = (position.x, position.y, position.z);
        if !(x.is_finite() && y.is_finite() && z.is_finite()) {
            return Err(BoundaryError::NonFiniteCoordinate(x, y, z));
        }

        Ok(CylindricalSolar {
            rho: y.hypot(z),
            phi: normalize_azimuth((-y).atan2(z)),
            ell: x,
        })
    }

    /// Inverse of [`CylindricalSolar::from_cartesian`].
    pub fn to_cartesian(&self) -> Vector3<f64> {
        let (sin_phi, cos_phi) = self.phi.sin_cos();
        Vector3::new(self.ell, -self.rho * sin_phi, self.rho * cos_phi)
    }

    /// `true` on the dawn flank (`phi >= 0`).
    pub fn is_dawn(&self) -> bool {
        self.phi >= 0.0
    }
}

/// Wrap an angle into `[-π, π)`.
///
/// `atan2` returns values in `(-π, π]`; the single value `π` is mapped to `-π` so the
/// half-open hemisphere bins leave no gap.
pub fn normalize_azimuth(phi: Radian) -> Radian {
    if (-PI..PI).contains(&phi) {
        return phi;
    }
    let wrapped = (phi + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped >= PI {
        -PI
    } else {
        wrapped
    }
}

/// Convert a batch of Cartesian positions, failing on the first malformed one.
pub fn convert_cartesian_to_cylindrical_solar(
    positions: &[Vector3<f64>],
) -> Result<Vec<CylindricalSolar>, BoundaryError> {
    positions.iter().map(CylindricalSolar::from_cartesian).collect()
}
