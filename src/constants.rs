//! # Constants and type definitions
//!
//! Physical constants, NAIF body identifiers, and the default analysis layout
//! (elevation/azimuth bin edges, radial grid) shared by every stage of the pipeline.
//!
//! ## Overview
//!
//! - Jovian and astronomical constants
//! - Unit aliases used across the crate
//! - NAIF integer codes for the bodies the JSS frame needs
//! - Defaults of the original bow shock / magnetopause analysis

// -------------------------------------------------------------------------------------------------
// Physical constants and unit conversions
// -------------------------------------------------------------------------------------------------

/// Jupiter equatorial radius in kilometers (IAU, `BODY599_RADII[0]`)
pub const JUPITER_RADIUS_KM: f64 = 71_492.0;

/// Number of seconds in a Julian day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Number of days in a Julian century
pub const DAYS_PER_JULIAN_CENTURY: f64 = 36_525.0;

/// Obliquity of the ecliptic at J2000 (IAU 1976), radians
pub const OBLIQUITY_J2000: f64 = 84_381.448 / 3600.0 * std::f64::consts::PI / 180.0;

/// Ephemeris-resolution tolerance (km) under which a crossing outside the
/// reachable radial range is attributed to sampling rather than to bad data.
pub const BOUND_TOLERANCE_KM: f64 = 50.0;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Distance in Jovian radii
pub type JovianRadius = f64;
/// Distance in kilometers
pub type Kilometer = f64;
/// Angle in radians
pub type Radian = f64;
/// Ephemeris time, TDB seconds past J2000
pub type EtSeconds = f64;
/// Dynamic pressure in nanopascal
pub type NanoPascal = f64;

// -------------------------------------------------------------------------------------------------
// NAIF identifiers
// -------------------------------------------------------------------------------------------------

/// Solar system barycenter
pub const NAIF_SSB: i32 = 0;
/// Jupiter system barycenter
pub const NAIF_JUPITER_BARYCENTER: i32 = 5;
/// Sun
pub const NAIF_SUN: i32 = 10;
/// Jupiter body center
pub const NAIF_JUPITER: i32 = 599;
/// Juno spacecraft
pub const NAIF_JUNO: i32 = -61;

// -------------------------------------------------------------------------------------------------
// Default analysis layout
// -------------------------------------------------------------------------------------------------

/// Elevation (`ell`) bins: `[-120, 40)` R_J, 10 R_J wide
pub const ELL_LEFT: JovianRadius = -120.0;
pub const ELL_RIGHT: JovianRadius = 40.0;
pub const ELL_STEP: JovianRadius = 10.0;

/// Azimuth (`phi`) bins: dusk `[-π, 0)` and dawn `[0, π)`
pub const PHI_LEFT: Radian = -std::f64::consts::PI;
pub const PHI_RIGHT: Radian = std::f64::consts::PI;
pub const PHI_STEP: Radian = std::f64::consts::PI;

/// Radial grid on which densities are evaluated
pub const RHO_GRID_START: JovianRadius = 50.0;
pub const RHO_GRID_STOP: JovianRadius = 200.0;
pub const RHO_GRID_POINTS: usize = 100;

/// Gaussian KDE bandwidth (R_J)
pub const KDE_BANDWIDTH: JovianRadius = 1.0;
