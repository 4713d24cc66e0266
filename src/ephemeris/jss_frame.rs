//! Jupiter–Sun–State (JSS) frame.
//!
//! * +X points from Jupiter toward the Sun,
//! * +Z is Jupiter's spin axis (IAU pole) made orthogonal to +X,
//! * +Y completes the right-handed set, pointing roughly against Jupiter's
//!   orbital motion.
//!
//! The pole follows the IAU Working Group 2015 model with its secular terms only:
//!
//! ```text
//! α0 = 268.056595 - 0.006499 T   (deg)
//! δ0 =  64.495303 + 0.002413 T   (deg)
//! ```
//!
//! where `T` is in Julian centuries (TDB) since J2000. The periodic Galilean
//! nutation terms change the pole by less than 0.001°, far below the 10 R_J
//! resolution of the boundary survey.
use nalgebra::{Matrix3, Vector3};

use crate::{boundary_errors::BoundaryError, constants::EtSeconds, time::centuries_since_j2000};

/// Norm under which a direction is treated as undefined.
const DEGENERATE_NORM: f64 = 1e-12;

/// Unit vector of Jupiter's north pole in J2000 at the given ET epoch.
pub fn jupiter_pole(et_seconds: EtSeconds) -> Vector3<f64> {
    let t = centuries_since_j2000(et_seconds);
    let alpha = (268.056_595 - 0.006_499 * t).to_radians();
    let delta = (64.495_303 + 0.002_413 * t).to_radians();
    Vector3::new(
        delta.cos() * alpha.cos(),
        delta.cos() * alpha.sin(),
        delta.sin(),
    )
}

/// Rotation matrix from J2000 to JSS.
///
/// Arguments
/// -----------------
/// * `sun_from_jupiter`: position of the Sun relative to Jupiter, J2000 (any length unit).
/// * `et_seconds`: epoch used to evaluate Jupiter's pole.
///
/// Return
/// ----------
/// * `M` such that `r_jss = M · r_j2000`, or [`BoundaryError::NonFiniteCoordinate`] if
///   the Sun direction is degenerate.
pub fn jss_rotation(
    sun_from_jupiter: &Vector3<f64>,
    et_seconds: EtSeconds,
) -> Result<Matrix3<f64>, BoundaryError> {
    let degenerate = || {
        BoundaryError::NonFiniteCoordinate(sun_from_jupiter.x, sun_from_jupiter.y, sun_from_jupiter.z)
    };

    let x_axis = sun_from_jupiter.try_normalize(DEGENERATE_NORM).ok_or_else(degenerate)?;
    let pole = jupiter_pole(et_seconds);
    let z_axis = (pole - x_axis * pole.dot(&x_axis))
        .try_normalize(DEGENERATE_NORM)
        .ok_or_else(degenerate)?;
    let y_axis = z_axis.cross(&x_axis);

    Ok(Matrix3::from_rows(&[
        x_axis.transpose(),
        y_axis.transpose(),
        z_axis.transpose(),
    ]))
}

#[cfg(test)]
mod test_jss_frame {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pole_at_j2000() {
        let pole = jupiter_pole(0.0);
        assert_relative_eq!(pole.norm(), 1.0, epsilon = 1e-15);
        let dec = pole.z.asin().to_degrees();
        assert_relative_eq!(dec, 64.495_303, epsilon = 1e-9);
    }

    #[test]
    fn test_rotation_is_orthonormal() {
        let sun = Vector3::new(-7.4e8, 1.2e8, 4.0e7);
        let m = jss_rotation(&sun, 5.0e8).unwrap();
        assert_relative_eq!(m * m.transpose(), Matrix3::identity(), epsilon = 1e-12);
        assert_relative_eq!(m.determinant(), 1.0, epsilon = 1e-12);

        // the Sun lies on +X
        let sun_jss = m * sun;
        assert_relative_eq!(sun_jss.x, sun.norm(), max_relative = 1e-12);
        assert!(sun_jss.y.abs() < 1e-3 && sun_jss.z.abs() < 1e-3);

        // the pole lies in the XZ plane, northward
        let pole_jss = m * jupiter_pole(5.0e8);
        assert!(pole_jss.y.abs() < 1e-12);
        assert!(pole_jss.z > 0.9);
    }

    #[test]
    fn test_degenerate_sun_direction() {
        assert!(jss_rotation(&Vector3::zeros(), 0.0).is_err());
        // Sun along the pole leaves no orthogonal component
        assert!(jss_rotation(&jupiter_pole(0.0), 0.0).is_err());
    }
}
