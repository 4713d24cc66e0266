//! Bayesian fit of a truncated-normal radial model by adaptive random-walk Metropolis.
//!
//! Each chain updates the free parameters one at a time with Gaussian proposals.
//! During the tuning phase the proposal scale of every parameter is adjusted after
//! each window of [`TUNE_WINDOW`] iterations, multiplying it by
//! `exp(GAIN · (rate - target))`, so the acceptance rate drifts toward the target.
//! Tuning draws are discarded.
//!
//! The log-likelihood of one observation is
//!
//! ```text
//! log φ((y - mu) / sigma) - log sigma - log(Φ(β) - Φ(α)),   α = (lower - mu) / sigma,
//!                                                           β = (upper - mu) / sigma
//! ```
//!
//! with the normalizing mass computed from the upper tails when `α > 0` to keep
//! precision far from the mean.
use log::{debug, warn};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::StandardNormal;
use statrs::{
    distribution::{ContinuousCDF, Normal},
    statistics::Statistics,
};

use crate::boundary_errors::BoundaryError;

use super::{FitResult, SamplerParams, SlopePrior};

/// Iterations between two proposal-scale adaptations.
pub const TUNE_WINDOW: usize = 50;
const ADAPT_GAIN: f64 = 3.0;
const MAX_START_ATTEMPTS: usize = 1000;
/// Spread of the chain starting intercepts, in units of the starting sigma.
const START_SPREAD: f64 = 2.0;
/// R-hat above which the chains are reported as not converged.
pub const R_HAT_WARNING: f64 = 1.05;

const INTERCEPT: usize = 0;
const SIGMA: usize = 1;
const SLOPE: usize = 2;

type Theta = [f64; 3];

struct TruncatedNormalModel<'a> {
    x: &'a [f64],
    y: &'a [f64],
    lower: f64,
    upper: f64,
    params: &'a SamplerParams,
    standard: Normal,
}

impl TruncatedNormalModel<'_> {
    fn free_parameters(&self) -> Vec<usize> {
        match self.params.slope_prior {
            SlopePrior::Fixed(_) => vec![INTERCEPT, SIGMA],
            SlopePrior::Uniform { .. } => vec![INTERCEPT, SIGMA, SLOPE],
        }
    }

    fn log_prior(&self, theta: &Theta) -> f64 {
        let (i_low, i_high) = self.params.intercept_prior;
        let (s_low, s_high) = self.params.sigma_prior;
        let slope_ok = match self.params.slope_prior {
            SlopePrior::Fixed(value) => theta[SLOPE] == value,
            SlopePrior::Uniform { low, high } => (low..high).contains(&theta[SLOPE]),
        };

        // uniform priors: constant inside the support
        if (i_low..i_high).contains(&theta[INTERCEPT])
            && theta[SIGMA] > s_low.max(0.0)
            && theta[SIGMA] < s_high
            && slope_ok
        {
            0.0
        } else {
            f64::NEG_INFINITY
        }
    }

    /// `log(Φ(β) - Φ(α))`
    fn log_mass(&self, alpha: f64, beta: f64) -> f64 {
        let mass = if alpha > 0.0 {
            self.standard.sf(alpha) - self.standard.sf(beta)
        } else {
            self.standard.cdf(beta) - self.standard.cdf(alpha)
        };
        if mass > 0.0 {
            mass.ln()
        } else {
            f64::NEG_INFINITY
        }
    }

    fn log_likelihood(&self, theta: &Theta) -> f64 {
        let (intercept, sigma, slope) = (theta[INTERCEPT], theta[SIGMA], theta[SLOPE]);
        let mut total = -(self.y.len() as f64) * sigma.ln();

        for (&xi, &yi) in self.x.iter().zip(self.y) {
            if yi < self.lower || yi > self.upper {
                return f64::NEG_INFINITY;
            }
            let mu = slope * xi + intercept;
            let z = (yi - mu) / sigma;
            let log_mass = self.log_mass((self.lower - mu) / sigma, (self.upper - mu) / sigma);
            if !log_mass.is_finite() {
                return f64::NEG_INFINITY;
            }
            total += -0.5 * z * z - log_mass;
        }
        total
    }

    fn log_posterior(&self, theta: &Theta) -> f64 {
        let prior = self.log_prior(theta);
        if !prior.is_finite() {
            return f64::NEG_INFINITY;
        }
        let posterior = prior + self.log_likelihood(theta);
        if posterior.is_nan() {
            f64::NEG_INFINITY
        } else {
            posterior
        }
    }

    /// Data-driven starting point, or a draw from the prior if it has no support.
    fn starting_point<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Theta> {
        let (i_low, i_high) = self.params.intercept_prior;
        let (s_low, s_high) = self.params.sigma_prior;
        let s_low = s_low.max(0.0);
        let slope = match self.params.slope_prior {
            SlopePrior::Fixed(value) => value,
            SlopePrior::Uniform { low, high } => 0.5 * (low + high),
        };

        let y_mean = self.y.iter().mean();
        let y_std = if self.y.len() > 1 {
            self.y.iter().std_dev()
        } else {
            f64::NAN
        };
        let sigma = if y_std.is_finite() && y_std > s_low && y_std < s_high {
            y_std
        } else {
            0.5 * (s_low + s_high)
        };
        let margin = 1e-6 * (i_high - i_low);
        let guess = [y_mean.clamp(i_low, i_high - margin), sigma, slope];
        if self.log_posterior(&guess).is_finite() {
            return Some(guess);
        }

        (0..MAX_START_ATTEMPTS)
            .map(|_| {
                let slope = match self.params.slope_prior {
                    SlopePrior::Fixed(value) => value,
                    SlopePrior::Uniform { low, high } => rng.random_range(low..high),
                };
                [
                    rng.random_range(i_low..i_high),
                    rng.random_range(s_low..s_high),
                    slope,
                ]
            })
            .find(|theta| theta[SIGMA] > 0.0 && self.log_posterior(theta).is_finite())
    }

    /// Over-dispersed start around `center`: the intercept moves by
    /// `START_SPREAD · sigma` standard deviations, sigma by a log-normal factor and
    /// a free slope is drawn from its prior. Falls back to `center` when no draw
    /// has a finite log-posterior.
    fn dispersed_start<R: Rng + ?Sized>(&self, center: &Theta, rng: &mut R) -> Theta {
        (0..MAX_START_ATTEMPTS)
            .map(|_| {
                let mut theta = *center;
                theta[INTERCEPT] += START_SPREAD * center[SIGMA] * rng.sample::<f64, _>(StandardNormal);
                theta[SIGMA] *= (0.5 * rng.sample::<f64, _>(StandardNormal)).exp();
                if let SlopePrior::Uniform { low, high } = self.params.slope_prior {
                    theta[SLOPE] = rng.random_range(low..high);
                }
                theta
            })
            .find(|theta| self.log_posterior(theta).is_finite())
            .unwrap_or(*center)
    }
}

struct ChainOutput {
    samples: Vec<Theta>,
    acceptance: f64,
}

fn run_chain<R: Rng + ?Sized>(
    model: &TruncatedNormalModel,
    start: Theta,
    chain: usize,
    rng: &mut R,
) -> Result<ChainOutput, BoundaryError> {
    let params = model.params;
    let free = model.free_parameters();
    let mut scales = [
        params.initial_scales.0,
        params.initial_scales.1,
        params.initial_scales.2,
    ];
    let max_scales = [
        params.intercept_prior.1 - params.intercept_prior.0,
        params.sigma_prior.1 - params.sigma_prior.0,
        match params.slope_prior {
            SlopePrior::Uniform { low, high } => high - low,
            SlopePrior::Fixed(_) => 1.0,
        },
    ];

    let mut current = start;
    let mut current_lp = model.log_posterior(&current);
    let mut window_accepts = [0usize; 3];
    let mut accepted = 0usize;
    let mut samples = Vec::with_capacity(params.draws);

    for step in 0..params.tune + params.draws {
        let tuning = step < params.tune;

        for &k in &free {
            let mut proposal = current;
            proposal[k] += scales[k] * rng.sample::<f64, _>(StandardNormal);
            let lp = model.log_posterior(&proposal);
            let accept = lp.is_finite()
                && (lp >= current_lp || rng.random::<f64>().ln() < lp - current_lp);
            if accept {
                current = proposal;
                current_lp = lp;
            }
            if tuning {
                window_accepts[k] += accept as usize;
            } else {
                accepted += accept as usize;
            }
        }

        if tuning && (step + 1) % TUNE_WINDOW == 0 {
            for &k in &free {
                let rate = window_accepts[k] as f64 / TUNE_WINDOW as f64;
                scales[k] = (scales[k] * (ADAPT_GAIN * (rate - params.target_accept)).exp())
                    .clamp(1e-9, max_scales[k]);
                window_accepts[k] = 0;
            }
        }

        if !tuning {
            if current.iter().any(|v| !v.is_finite()) {
                return Err(BoundaryError::SamplerFailure(format!(
                    "chain {chain} produced a non-finite sample {current:?}"
                )));
            }
            samples.push(current);
        }
    }

    if params.draws > 0 && accepted == 0 {
        return Err(BoundaryError::SamplerFailure(format!(
            "chain {chain} rejected every proposal"
        )));
    }

    let proposals = (params.draws * free.len()).max(1);
    Ok(ChainOutput {
        samples,
        acceptance: accepted as f64 / proposals as f64,
    })
}

/// Gelman–Rubin potential scale reduction of several chains of one parameter.
///
/// Return
/// ----------
/// * `None` with fewer than two chains, fewer than two draws, or zero
///   within-chain variance.
pub fn gelman_rubin(chains: &[Vec<f64>]) -> Option<f64> {
    let n = chains.iter().map(Vec::len).min()?;
    if chains.len() < 2 || n < 2 {
        return None;
    }

    let means: Vec<f64> = chains.iter().map(|c| c[..n].iter().mean()).collect();
    let within = chains.iter().map(|c| c[..n].iter().variance()).mean();
    if !(within > 0.0) {
        return None;
    }
    let between = n as f64 * means.iter().variance();
    let n = n as f64;
    let pooled = (n - 1.0) / n * within + between / n;
    Some((pooled / within).sqrt())
}

/// Reject priors with empty supports and chain layouts that produce no samples.
pub fn check_sampler_params(params: &SamplerParams) -> Result<(), BoundaryError> {
    let invalid = |reason: String| Err(BoundaryError::SamplerFailure(reason));
    let (i_low, i_high) = params.intercept_prior;
    let (s_low, s_high) = params.sigma_prior;

    if !(i_low < i_high) {
        return invalid(format!("empty intercept prior [{i_low}, {i_high})"));
    }
    if !(s_low.max(0.0) < s_high) {
        return invalid(format!("empty sigma prior [{s_low}, {s_high})"));
    }
    if let SlopePrior::Uniform { low, high } = params.slope_prior {
        if !(low < high) {
            return invalid(format!("empty slope prior [{low}, {high})"));
        }
    }
    if params.chains == 0 || params.draws == 0 {
        return invalid(format!(
            "{} chains of {} draws",
            params.chains, params.draws
        ));
    }
    Ok(())
}

/// Sample the posterior of the truncated-normal radial model of one bin.
///
/// Arguments
/// -----------------
/// * `x`: elevation of each crossing (R_J).
/// * `y`: radius of each crossing (R_J), inside `bounds`.
/// * `bounds`: truncation `(lower, upper)` of the radius (R_J).
/// * `params`: priors, chain count and lengths, proposal tuning.
/// * `rng`: generator seeding the chains.
///
/// Return
/// ----------
/// * The posterior samples with acceptance rates and R-hat, or
///   [`BoundaryError::SamplerFailure`] when the data admit no finite starting point
///   or a chain never moves.
///
/// See also
/// ------------
/// * [`crate::fit::GaussianKde`] – Smoothing of the intercept samples.
pub fn fit_truncated_normal<R: Rng + ?Sized>(
    x: &[f64],
    y: &[f64],
    bounds: (f64, f64),
    params: &SamplerParams,
    rng: &mut R,
) -> Result<FitResult, BoundaryError> {
    if x.len() != y.len() {
        return Err(BoundaryError::SamplerFailure(format!(
            "{} elevations for {} radii",
            x.len(),
            y.len()
        )));
    }
    if y.is_empty() {
        return Err(BoundaryError::SamplerFailure("no data to fit".to_string()));
    }
    check_sampler_params(params)?;
    let (lower, upper) = bounds;
    if !(lower < upper) {
        return Err(BoundaryError::SamplerFailure(format!(
            "empty truncation interval [{lower}, {upper}]"
        )));
    }

    let standard = Normal::new(0.0, 1.0)
        .map_err(|e| BoundaryError::SamplerFailure(format!("standard normal: {e}")))?;
    let model = TruncatedNormalModel {
        x,
        y,
        lower,
        upper,
        params,
        standard,
    };

    let start = model.starting_point(rng).ok_or_else(|| {
        BoundaryError::SamplerFailure("no starting point with a finite log-posterior".to_string())
    })?;

    let mut outputs = Vec::with_capacity(params.chains);
    for chain in 0..params.chains {
        let mut chain_rng = StdRng::seed_from_u64(rng.random::<u64>());
        let chain_start = if chain == 0 {
            start
        } else {
            model.dispersed_start(&start, &mut chain_rng)
        };
        outputs.push(run_chain(&model, chain_start, chain, &mut chain_rng)?);
    }

    let column = |k: usize| -> Vec<Vec<f64>> {
        outputs
            .iter()
            .map(|o| o.samples.iter().map(|theta| theta[k]).collect())
            .collect()
    };
    let intercept_chains = column(INTERCEPT);
    let r_hat = gelman_rubin(&intercept_chains);
    if let Some(r_hat) = r_hat.filter(|&r| r > R_HAT_WARNING) {
        warn!("intercept chains have not converged (R-hat = {r_hat:.3})");
    }

    let result = FitResult {
        intercept: intercept_chains.concat(),
        sigma: column(SIGMA).concat(),
        slope: match params.slope_prior {
            SlopePrior::Fixed(_) => Vec::new(),
            SlopePrior::Uniform { .. } => column(SLOPE).concat(),
        },
        acceptance: outputs.iter().map(|o| o.acceptance).collect(),
        r_hat,
    };
    debug!("{result}");
    Ok(result)
}
