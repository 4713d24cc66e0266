use camino::Utf8PathBuf;
use clap::{ArgGroup, Parser};
use env_logger::{Builder, Env, Target};
use itertools::Itertools;
use log::{info, warn};

use boundary_density::{
    boundary_errors::BoundaryError,
    bounds::BoundPolicy,
    config::AnalysisParams,
    crossings::{Boundary, CrossingList},
    ephemeris::SpacecraftEphemeris,
    pipeline::{analyze_rho_distributions, AnalysisInputs},
    solar_wind::{MissingPolicy, SolarWindSeries},
};

#[derive(Parser, Debug)]
#[command(
    name = "boundary-density",
    about = "Radial probability map of bow shock or magnetopause crossings"
)]
#[command(group(
    ArgGroup::new("ephemeris")
        .required(true)
        .multiple(true)
        .args(["metakernel", "kernel", "ephemeris_table"])
))]
struct Cli {
    /// Combined crossing list (datetime, x_JSS, y_JSS, z_JSS[, boundary])
    #[arg(long)]
    crossings: Utf8PathBuf,

    /// Hourly solar-wind ensemble (datetime, p_dyn, p_dyn_neg_unc, p_dyn_pos_unc)
    #[arg(long)]
    solar_wind: Option<Utf8PathBuf>,

    /// Meta-kernel listing SPK kernels (repeatable, e.g. planetary then Juno)
    #[arg(long)]
    metakernel: Vec<Utf8PathBuf>,

    /// SPK kernel loaded after the meta-kernels, later ones taking precedence
    #[arg(long)]
    kernel: Vec<Utf8PathBuf>,

    /// Pre-computed JSS ephemeris (datetime, x, y, z in km)
    #[arg(long, conflicts_with_all = ["metakernel", "kernel"])]
    ephemeris_table: Option<Utf8PathBuf>,

    /// Boundary to analyze: bs or mp
    #[arg(long, default_value = "bs")]
    boundary: Boundary,

    #[arg(long, default_value = ".")]
    output_dir: Utf8PathBuf,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Flag bins with bound violations or failed fits instead of stopping
    #[arg(long, default_value_t = false)]
    flag_violations: bool,

    /// Leave crossings without solar wind instead of stopping
    #[arg(long, default_value_t = false)]
    skip_missing_solar_wind: bool,

    /// Only log warnings and errors
    #[arg(long, default_value_t = false)]
    quiet: bool,
}

fn load_ephemeris(cli: &Cli) -> Result<SpacecraftEphemeris, BoundaryError> {
    match &cli.ephemeris_table {
        Some(path) => SpacecraftEphemeris::from_table(path),
        None => SpacecraftEphemeris::from_kernel_sets(&cli.metakernel, &cli.kernel),
    }
}

fn main() -> Result<(), BoundaryError> {
    let cli = Cli::parse();

    let level = if cli.quiet { "warn" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(level))
        .target(Target::Stdout)
        .format_timestamp_secs()
        .format_module_path(false)
        .init();

    let params = AnalysisParams::builder()
        .seed(cli.seed)
        .bound_policy(if cli.flag_violations {
            BoundPolicy::Flag
        } else {
            BoundPolicy::Halt
        })
        .missing_solar_wind(if cli.skip_missing_solar_wind {
            MissingPolicy::Skip
        } else {
            MissingPolicy::Error
        })
        .build()?;

    let crossings = CrossingList::from_csv(&cli.crossings, cli.boundary)?;
    if crossings.is_empty() {
        return Err(BoundaryError::EmptyCrossingList(cli.boundary.to_string()));
    }
    info!("Read {} {} crossings from {}", crossings.len(), cli.boundary, cli.crossings);

    let solar_wind = match &cli.solar_wind {
        Some(path) => {
            let series = SolarWindSeries::from_csv(path)?;
            info!("Read {} hourly solar wind estimates from {path}", series.len());
            Some(series)
        }
        None => None,
    };

    let inputs = AnalysisInputs {
        crossings,
        solar_wind,
        ephemeris: load_ephemeris(&cli)?,
    };
    let report = analyze_rho_distributions(&inputs, &params)?;

    for summary in report.summaries().iter().filter(|s| s.number > 0) {
        info!("\n{summary}");
    }
    if !report.flagged.is_empty() {
        warn!("Bins flagged for inspection: {}", report.flagged.iter().join(", "));
    }

    std::fs::create_dir_all(&cli.output_dir)?;
    let output = cli.output_dir.join(cli.boundary.output_file_name());
    report.map.write_csv(&output)?;
    Ok(())
}
