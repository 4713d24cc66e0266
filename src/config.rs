//! # Analysis configuration
//!
//! [`AnalysisParams`] gathers every knob of the radial-density analysis: the spatial
//! bin layout, the radial grid and KDE bandwidth, the bound tolerance and the
//! failure policies, and the sampler settings. The defaults reproduce the
//! reference bow shock / magnetopause analysis.
//!
//! ```rust,no_run
//! use boundary_density::config::AnalysisParams;
//! use boundary_density::bounds::BoundPolicy;
//!
//! let params = AnalysisParams::builder()
//!     .ell_step(20.0)
//!     .draws(2000)
//!     .seed(7)
//!     .bound_policy(BoundPolicy::Flag)
//!     .build()
//!     .unwrap();
//! ```
use std::cmp::Ordering::{Equal, Greater, Less};

use crate::{
    binning::{BinEdges, BinGrid},
    boundary_errors::BoundaryError,
    bounds::BoundPolicy,
    constants::{
        Kilometer, BOUND_TOLERANCE_KM, ELL_LEFT, ELL_RIGHT, ELL_STEP, KDE_BANDWIDTH, PHI_LEFT,
        PHI_RIGHT, PHI_STEP, RHO_GRID_POINTS, RHO_GRID_START, RHO_GRID_STOP,
    },
    fit::{truncated::check_sampler_params, SamplerParams, SlopePrior},
    grid::RadialGrid,
    solar_wind::MissingPolicy,
};

/// Configuration of one analysis run.
///
/// Default values
/// -----------------
/// * `ell_left`, `ell_right`, `ell_step`: -120, 40, 10 R_J
/// * `phi_step`: π (one bin per hemisphere over `[-π, π)`)
/// * `rho_start`, `rho_stop`, `rho_points`: 50, 200 R_J, 100 points
/// * `kde_bandwidth`: 1 R_J
/// * `tolerance_km`: 50 km
/// * `bound_policy`: [`BoundPolicy::Halt`]
/// * `missing_solar_wind`: [`MissingPolicy::Error`]
/// * `sampler`: [`SamplerParams::default`]
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisParams {
    // --- Spatial bins ---
    pub ell_left: f64,
    pub ell_right: f64,
    pub ell_step: f64,
    pub phi_step: f64,

    // --- Density evaluation ---
    pub rho_start: f64,
    pub rho_stop: f64,
    pub rho_points: usize,
    pub kde_bandwidth: f64,

    // --- Bounds and failure handling ---
    /// Overshoot (km) under which a crossing outside the ephemeris range is accepted.
    pub tolerance_km: Kilometer,
    pub bound_policy: BoundPolicy,
    pub missing_solar_wind: MissingPolicy,

    pub sampler: SamplerParams,
}

impl AnalysisParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fluent builder starting from the defaults.
    pub fn builder() -> AnalysisParamsBuilder {
        AnalysisParamsBuilder::new()
    }

    /// Elevation × hemisphere grid described by the parameters.
    pub fn bin_grid(&self) -> Result<BinGrid, BoundaryError> {
        Ok(BinGrid::new(
            BinEdges::regular(self.ell_left, self.ell_right, self.ell_step)?,
            BinEdges::regular(PHI_LEFT, PHI_RIGHT, self.phi_step)?,
        ))
    }

    pub fn radial_grid(&self) -> Result<RadialGrid, BoundaryError> {
        RadialGrid::linspace(self.rho_start, self.rho_stop, self.rho_points)
    }
}

impl Default for AnalysisParams {
    fn default() -> Self {
        AnalysisParams {
            ell_left: ELL_LEFT,
            ell_right: ELL_RIGHT,
            ell_step: ELL_STEP,
            phi_step: PHI_STEP,

            rho_start: RHO_GRID_START,
            rho_stop: RHO_GRID_STOP,
            rho_points: RHO_GRID_POINTS,
            kde_bandwidth: KDE_BANDWIDTH,

            tolerance_km: BOUND_TOLERANCE_KM,
            bound_policy: BoundPolicy::default(),
            missing_solar_wind: MissingPolicy::default(),

            sampler: SamplerParams::default(),
        }
    }
}

/// Builder for [`AnalysisParams`], with validation.
#[derive(Debug, Clone)]
pub struct AnalysisParamsBuilder {
    params: AnalysisParams,
}

impl Default for AnalysisParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: AnalysisParams::default(),
        }
    }

    // --- Spatial bins ---
    pub fn ell_left(mut self, v: f64) -> Self {
        self.params.ell_left = v;
        self
    }
    pub fn ell_right(mut self, v: f64) -> Self {
        self.params.ell_right = v;
        self
    }
    pub fn ell_step(mut self, v: f64) -> Self {
        self.params.ell_step = v;
        self
    }
    pub fn phi_step(mut self, v: f64) -> Self {
        self.params.phi_step = v;
        self
    }

    // --- Density evaluation ---
    pub fn rho_grid(mut self, start: f64, stop: f64, points: usize) -> Self {
        self.params.rho_start = start;
        self.params.rho_stop = stop;
        self.params.rho_points = points;
        self
    }
    pub fn kde_bandwidth(mut self, v: f64) -> Self {
        self.params.kde_bandwidth = v;
        self
    }

    // --- Bounds and failure handling ---
    pub fn tolerance_km(mut self, v: f64) -> Self {
        self.params.tolerance_km = v;
        self
    }
    pub fn bound_policy(mut self, v: BoundPolicy) -> Self {
        self.params.bound_policy = v;
        self
    }
    pub fn missing_solar_wind(mut self, v: MissingPolicy) -> Self {
        self.params.missing_solar_wind = v;
        self
    }

    // --- Sampler ---
    pub fn sampler(mut self, v: SamplerParams) -> Self {
        self.params.sampler = v;
        self
    }
    pub fn chains(mut self, v: usize) -> Self {
        self.params.sampler.chains = v;
        self
    }
    pub fn tune(mut self, v: usize) -> Self {
        self.params.sampler.tune = v;
        self
    }
    pub fn draws(mut self, v: usize) -> Self {
        self.params.sampler.draws = v;
        self
    }
    pub fn intercept_prior(mut self, low: f64, high: f64) -> Self {
        self.params.sampler.intercept_prior = (low, high);
        self
    }
    pub fn sigma_prior(mut self, low: f64, high: f64) -> Self {
        self.params.sampler.sigma_prior = (low, high);
        self
    }
    pub fn slope_prior(mut self, v: SlopePrior) -> Self {
        self.params.sampler.slope_prior = v;
        self
    }
    pub fn seed(mut self, v: u64) -> Self {
        self.params.sampler.seed = v;
        self
    }

    /// Return true iff x > 0.0 and comparable (i.e., not NaN).
    #[inline]
    fn gt0(x: f64) -> bool {
        x.partial_cmp(&0.0) == Some(Greater)
    }

    /// Return true iff x >= 0.0 and comparable (i.e., not NaN).
    #[inline]
    fn ge0(x: f64) -> bool {
        matches!(x.partial_cmp(&0.0), Some(Greater) | Some(Equal))
    }

    /// Return true iff a < b and comparable (i.e., not NaN).
    #[inline]
    fn lt(a: f64, b: f64) -> bool {
        a.partial_cmp(&b) == Some(Less)
    }

    /// Finalize the builder.
    ///
    /// Validation rules
    /// -----------------
    /// * `ell_left < ell_right`, `ell_step > 0`, `phi_step ∈ (0, 2π]`.
    /// * `rho_start < rho_stop`, `rho_points ≥ 2`.
    /// * `kde_bandwidth > 0`, `tolerance_km ≥ 0`.
    /// * Sampler: non-empty priors, at least one chain and one draw,
    ///   `target_accept ∈ (0, 1)`, positive initial proposal scales.
    ///
    /// Return
    /// ----------
    /// * The parameters, or [`BoundaryError::InvalidAnalysisParams`] naming the first
    ///   rule that failed.
    pub fn build(self) -> Result<AnalysisParams, BoundaryError> {
        let p = &self.params;
        let invalid = |reason: &str| Err(BoundaryError::InvalidAnalysisParams(reason.into()));

        if !Self::lt(p.ell_left, p.ell_right) || !Self::gt0(p.ell_step) {
            return invalid("elevation bins need ell_left < ell_right and ell_step > 0");
        }
        if !Self::gt0(p.phi_step) || p.phi_step > PHI_RIGHT - PHI_LEFT {
            return invalid("phi_step must lie in (0, 2π]");
        }
        if !Self::lt(p.rho_start, p.rho_stop) || p.rho_points < 2 {
            return invalid("radial grid needs rho_start < rho_stop and at least two points");
        }
        if !Self::gt0(p.kde_bandwidth) {
            return invalid("kde_bandwidth must be > 0");
        }
        if !Self::ge0(p.tolerance_km) {
            return invalid("tolerance_km must be >= 0");
        }

        let s = &p.sampler;
        if !(Self::gt0(s.target_accept) && Self::lt(s.target_accept, 1.0)) {
            return invalid("target_accept must lie in (0, 1)");
        }
        let (a, b, c) = s.initial_scales;
        if !(Self::gt0(a) && Self::gt0(b) && Self::gt0(c)) {
            return invalid("initial proposal scales must be > 0");
        }
        check_sampler_params(s).map_err(|e| match e {
            BoundaryError::SamplerFailure(reason) => BoundaryError::InvalidAnalysisParams(reason),
            other => other,
        })?;

        Ok(self.params)
    }
}
