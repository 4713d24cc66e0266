//! # Radial density analysis
//!
//! End-to-end processing of one boundary:
//!
//! 1. attach the solar-wind pressure of its hour to every crossing,
//! 2. compute the hourly spacecraft ephemeris over the crossing span,
//! 3. split crossings and ephemeris among the (elevation, hemisphere) bins,
//! 4. derive the reachable radial range of each bin and check the crossings against it,
//! 5. fit the truncated-normal radial model of each bin with crossings,
//! 6. smooth the intercept posterior on the radial grid,
//! 7. stack the bin densities into the probability map.
//!
//! Bins without crossings keep an all-zero density and never reach the sampler.
//! A bound violation or a sampler failure either stops the run or flags the bin,
//! following [`BoundPolicy`].
//!
//! ## See also
//! ------------
//! * [`crate::config::AnalysisParams`] – Layout, priors and policies of the run.
//! * [`crate::export::ProbabilityMap::write_csv`] – Output of the map.
use log::{debug, info, warn};
use rand::{rngs::StdRng, SeedableRng};

#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    binning::{BinIndex, SpatialBin},
    boundary_errors::BoundaryError,
    bounds::{BoundPolicy, PhysicalBounds},
    config::AnalysisParams,
    crossings::CrossingList,
    ephemeris::SpacecraftEphemeris,
    export::ProbabilityMap,
    fit::{fit_truncated_normal, GaussianKde},
    report::BinSummary,
    solar_wind::SolarWindSeries,
    time::hourly_span,
};

/// Data of one analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisInputs {
    pub crossings: CrossingList,
    /// Hourly solar-wind estimates; the attachment step is skipped without them.
    pub solar_wind: Option<SolarWindSeries>,
    pub ephemeris: SpacecraftEphemeris,
}

/// Outcome of [`analyze_rho_distributions`].
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    /// Every bin of the grid, elevation-major, with its fit and density.
    pub bins: Vec<SpatialBin>,
    /// Bins that violated their bounds or failed to fit under [`BoundPolicy::Flag`].
    pub flagged: Vec<BinIndex>,
    /// Crossings left without solar-wind pressure.
    pub missing_solar_wind: usize,
    pub map: ProbabilityMap,
}

impl AnalysisReport {
    pub fn summaries(&self) -> Vec<BinSummary> {
        self.bins.iter().map(BinSummary::from).collect()
    }
}

/// Fit one bin and evaluate its intercept density.
///
/// Return
/// ----------
/// * `Ok(flagged)`: whether the bin was flagged. Errors only under [`BoundPolicy::Halt`].
fn process_bin(
    bin: &mut SpatialBin,
    params: &AnalysisParams,
    radii: &[f64],
    rng: &mut StdRng,
) -> Result<bool, BoundaryError> {
    let zeros = vec![0.0; radii.len()];
    let crossing_rhos = bin.crossing_rhos();

    let Some(bounds) = PhysicalBounds::assess(&bin.ephemeris_rhos(), &crossing_rhos, params.tolerance_km)
    else {
        bin.density = zeros;
        return Ok(false);
    };
    let (bounds, mut flagged) = bounds.enforce(bin.index, &crossing_rhos, params.bound_policy)?;
    bin.bounds = Some(bounds);

    if bin.number() == 0 {
        bin.density = zeros;
        return Ok(flagged);
    }

    let fit = fit_truncated_normal(
        &bin.crossing_ells(),
        &crossing_rhos,
        (bounds.lower, bounds.upper),
        &params.sampler,
        rng,
    );
    match fit {
        Ok(result) => {
            debug!("Bin {}: {result}", bin.index);
            bin.density = GaussianKde::new(&result.intercept, params.kde_bandwidth)?.evaluate(radii);
            bin.fit = Some(result);
        }
        Err(error) => {
            let error = BoundaryError::SamplerFailure(format!("bin {}: {error}", bin.index));
            match params.bound_policy {
                BoundPolicy::Halt => return Err(error),
                BoundPolicy::Flag => {
                    warn!("{error}; bin flagged for inspection");
                    bin.density = zeros;
                    flagged = true;
                }
            }
        }
    }
    Ok(flagged)
}

/// Build the radial probability map of one boundary.
///
/// Arguments
/// -----------------
/// * `inputs`: crossings of the boundary, optional solar wind, spacecraft ephemeris.
/// * `params`: bin layout, radial grid, tolerance, policies and sampler settings.
///
/// Return
/// ----------
/// * The analyzed bins, the flagged bins and the probability map, or the first
///   error met: [`BoundaryError::EmptyCrossingList`] without crossings, a solar-wind
///   or ephemeris coverage error, or a bound or sampler error under
///   [`BoundPolicy::Halt`].
///
/// The generator driving the sampler is seeded from `params.sampler.seed` and the
/// bins are processed in order, so a run is reproducible.
pub fn analyze_rho_distributions(
    inputs: &AnalysisInputs,
    params: &AnalysisParams,
) -> Result<AnalysisReport, BoundaryError> {
    let boundary = inputs.crossings.boundary();
    let (Some(earliest), Some(latest)) = (inputs.crossings.earliest(), inputs.crossings.latest())
    else {
        return Err(BoundaryError::EmptyCrossingList(boundary.to_string()));
    };
    info!(
        "Analyzing {} {boundary} crossings from {earliest} to {latest}",
        inputs.crossings.len()
    );

    let mut crossings = inputs.crossings.clone();
    let missing_solar_wind = match &inputs.solar_wind {
        Some(series) => crossings.attach_solar_wind(series, params.missing_solar_wind)?,
        None => 0,
    };

    let span = hourly_span(earliest, latest);
    let ephemeris = inputs.ephemeris.ephemeris_over(&span)?;
    info!("Computed {} hourly ephemeris samples", ephemeris.len());

    let grid = params.bin_grid()?;
    let radial_grid = params.radial_grid()?;
    let mut bins = grid.partition(crossings.records(), &ephemeris);

    let mut rng = StdRng::seed_from_u64(params.sampler.seed);
    let mut flagged = Vec::new();

    #[cfg(feature = "progress")]
    let pb = {
        let pb = ProgressBar::new(bins.len() as u64);
        if let Ok(style) = ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} bins | {msg}") {
            pb.set_style(style);
        }
        pb
    };

    for bin in bins.iter_mut() {
        info!(
            "Bin {}: time_in_bin = {}, number = {}",
            bin.index,
            bin.time_in_bin(),
            bin.number()
        );
        #[cfg(feature = "progress")]
        pb.set_message(bin.index.to_string());

        if process_bin(bin, params, radial_grid.points(), &mut rng)? {
            flagged.push(bin.index);
        }

        #[cfg(feature = "progress")]
        pb.inc(1);
    }

    #[cfg(feature = "progress")]
    pb.finish_and_clear();

    if !flagged.is_empty() {
        warn!("{} bins flagged for inspection", flagged.len());
    }

    let map = ProbabilityMap::assemble(&bins, &radial_grid, grid.n_phi(), grid.n_ell())?;
    Ok(AnalysisReport {
        bins,
        flagged,
        missing_solar_wind,
        map,
    })
}

#[cfg(test)]
mod test_pipeline {
    use super::*;
    use crate::{
        constants::JUPITER_RADIUS_KM,
        crossings::{Boundary, CrossingRecord},
        ephemeris::table::EphemerisTable,
        solar_wind::{DynamicPressure, MissingPolicy},
    };
    use hifitime::{Epoch, Unit};
    use nalgebra::Vector3;

    /// Spacecraft drifting along -y at x = -115 R_J, from rho = 70 to 110 R_J over 48 h.
    fn drifting_table(t0: Epoch) -> SpacecraftEphemeris {
        let samples = (0..=48i64)
            .map(|h| {
                let rho = 70.0 + h as f64 * 40.0 / 48.0;
                (
                    t0 + Unit::Hour * h,
                    Vector3::new(-115.0, -rho, 0.0) * JUPITER_RADIUS_KM,
                )
            })
            .collect();
        SpacecraftEphemeris::Table(EphemerisTable::from_samples(samples, "memory").unwrap())
    }

    fn quick_params() -> AnalysisParams {
        AnalysisParams::builder().chains(2).tune(300).draws(300).build().unwrap()
    }

    #[test]
    fn test_empty_crossing_list() {
        let t0 = Epoch::from_gregorian_utc_hms(2017, 1, 1, 0, 0, 0);
        let inputs = AnalysisInputs {
            crossings: CrossingList::from_records(Boundary::Magnetopause, vec![]),
            solar_wind: None,
            ephemeris: drifting_table(t0),
        };
        assert_eq!(
            analyze_rho_distributions(&inputs, &quick_params()).unwrap_err(),
            BoundaryError::EmptyCrossingList("magnetopause".to_string())
        );
    }

    #[test]
    fn test_single_bin_analysis() {
        let t0 = Epoch::from_gregorian_utc_hms(2017, 1, 1, 0, 0, 0);
        // crossings on the trajectory, at rho = 80, 85, 90, 92.5, 95 R_J
        let records: Vec<CrossingRecord> = [12i64, 18, 24, 27, 30]
            .iter()
            .map(|&h| {
                CrossingRecord::new(
                    t0 + Unit::Hour * h,
                    Boundary::BowShock,
                    Vector3::new(-115.0, -(70.0 + h as f64 * 40.0 / 48.0), 0.0),
                )
                .unwrap()
            })
            .collect();

        let mut series = SolarWindSeries::default();
        for record in &records {
            series.insert(
                record.epoch,
                DynamicPressure {
                    p_dyn: 0.1,
                    neg_unc: 0.05,
                    pos_unc: 0.2,
                },
            );
        }

        let inputs = AnalysisInputs {
            crossings: CrossingList::from_records(Boundary::BowShock, records),
            solar_wind: Some(series),
            ephemeris: drifting_table(t0),
        };
        let params = AnalysisParams::builder()
            .chains(2)
            .tune(300)
            .draws(300)
            .missing_solar_wind(MissingPolicy::Error)
            .build()
            .unwrap();
        let report = analyze_rho_distributions(&inputs, &params).unwrap();

        assert!(report.flagged.is_empty());
        assert_eq!(report.missing_solar_wind, 0);
        assert_eq!(report.bins.len(), 32);
        assert_eq!(report.map.shape(), (100, 2, 16));

        // y < 0 with z = 0 is the dawn side, first elevation bin
        let fitted = &report.bins[1];
        assert_eq!(fitted.index, BinIndex { ell: 0, phi: 1 });
        assert_eq!(fitted.number(), 5);
        assert!(fitted.fit.is_some());
        let bounds = fitted.bounds.unwrap();
        assert!(fitted.crossing_rhos().iter().all(|&r| bounds.contains(r)));
        assert!(fitted.density.iter().any(|&d| d > 0.0));

        for bin in report.bins.iter().filter(|b| b.number() == 0) {
            assert_eq!(bin.density, vec![0.0; 100]);
            assert!(bin.fit.is_none());
        }

        // determinism
        let again = analyze_rho_distributions(&inputs, &params).unwrap();
        assert_eq!(again.map, report.map);
    }

    #[test]
    fn test_violation_policies() {
        let t0 = Epoch::from_gregorian_utc_hms(2017, 1, 1, 0, 0, 0);
        // between hours 12 and 19 the spacecraft stays within 80 to 86 R_J
        let records = vec![
            CrossingRecord::new(t0 + Unit::Hour * 12, Boundary::BowShock, Vector3::new(-115.0, -80.0, 0.0)).unwrap(),
            CrossingRecord::new(t0 + Unit::Hour * 18, Boundary::BowShock, Vector3::new(-115.0, -130.0, 0.0)).unwrap(),
        ];
        let inputs = AnalysisInputs {
            crossings: CrossingList::from_records(Boundary::BowShock, records),
            solar_wind: None,
            ephemeris: drifting_table(t0),
        };

        let halted = analyze_rho_distributions(&inputs, &quick_params());
        assert!(matches!(halted, Err(BoundaryError::BoundViolation { .. })));

        let flag = AnalysisParams::builder()
            .chains(2)
            .tune(300)
            .draws(300)
            .bound_policy(BoundPolicy::Flag)
            .build()
            .unwrap();
        let report = analyze_rho_distributions(&inputs, &flag).unwrap();
        assert_eq!(report.flagged, vec![BinIndex { ell: 0, phi: 1 }]);
        assert_eq!(report.bins[1].bounds.unwrap().upper, 130.0);
    }
}
