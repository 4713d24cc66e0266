use thiserror::Error;

use crate::binning::BinIndex;

#[derive(Error, Debug)]
pub enum BoundaryError {
    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Non-finite coordinate: ({0}, {1}, {2})")]
    NonFiniteCoordinate(f64, f64, f64),

    #[error("No {0} crossings to analyze")]
    EmptyCrossingList(String),

    #[error("No solar wind estimate for the hour of {0}")]
    MissingSolarWind(hifitime::Epoch),

    #[error("Invalid solar wind file: {0}")]
    InvalidSolarWindFile(String),

    #[error("Invalid DAF file: {0}")]
    InvalidDafFile(String),

    #[error("Unsupported binary format: {0} (only LTL-IEEE kernels are read)")]
    UnsupportedBinaryFormat(String),

    #[error("Error during the nom parsing: {0}")]
    NomParsingError(String),

    #[error("Invalid meta-kernel: {0}")]
    InvalidMetaKernel(String),

    #[error("No ephemeris coverage for body {target} relative to {center} at ET {et_seconds}")]
    NoEphemerisCoverage {
        target: i32,
        center: i32,
        et_seconds: f64,
    },

    #[error("Ephemeris table {0} needs at least two samples")]
    EphemerisTableTooShort(String),

    #[error("Epoch {0} is outside the ephemeris table span")]
    OutsideEphemerisTable(hifitime::Epoch),

    #[error(
        "Bin {bin}: crossing radius {crossing_rho:.3} R_J lies {excess_km:.1} km outside the reachable range [{lower:.3}, {upper:.3}] R_J"
    )]
    BoundViolation {
        bin: BinIndex,
        crossing_rho: f64,
        lower: f64,
        upper: f64,
        excess_km: f64,
    },

    #[error("Bin {bin}: crossings present but the spacecraft never visited the bin")]
    UnreachableBin { bin: BinIndex },

    #[error("Sampler failure: {0}")]
    SamplerFailure(String),

    #[error("Invalid analysis parameters: {0}")]
    InvalidAnalysisParams(String),
}

impl PartialEq for BoundaryError {
    fn eq(&self, other: &Self) -> bool {
        use BoundaryError::*;
        match (self, other) {
            // I/O and CSV errors are not comparable: equal if same variant
            (IoError(_), IoError(_)) => true,
            (CsvError(_), CsvError(_)) => true,

            (InvalidTimestamp(a), InvalidTimestamp(b)) => a == b,
            (NonFiniteCoordinate(a, b, c), NonFiniteCoordinate(d, e, f)) => {
                a.to_bits() == d.to_bits() && b.to_bits() == e.to_bits() && c.to_bits() == f.to_bits()
            }
            (EmptyCrossingList(a), EmptyCrossingList(b)) => a == b,
            (MissingSolarWind(a), MissingSolarWind(b)) => a == b,
            (InvalidSolarWindFile(a), InvalidSolarWindFile(b)) => a == b,
            (InvalidDafFile(a), InvalidDafFile(b)) => a == b,
            (UnsupportedBinaryFormat(a), UnsupportedBinaryFormat(b)) => a == b,
            (NomParsingError(a), NomParsingError(b)) => a == b,
            (InvalidMetaKernel(a), InvalidMetaKernel(b)) => a == b,
            (
                NoEphemerisCoverage {
                    target: t1,
                    center: c1,
                    et_seconds: e1,
                },
                NoEphemerisCoverage {
                    target: t2,
                    center: c2,
                    et_seconds: e2,
                },
            ) => t1 == t2 && c1 == c2 && e1 == e2,
            (EphemerisTableTooShort(a), EphemerisTableTooShort(b)) => a == b,
            (OutsideEphemerisTable(a), OutsideEphemerisTable(b)) => a == b,
            (BoundViolation { bin: a, .. }, BoundViolation { bin: b, .. }) => a == b,
            (UnreachableBin { bin: a }, UnreachableBin { bin: b }) => a == b,
            (SamplerFailure(a), SamplerFailure(b)) => a == b,
            (InvalidAnalysisParams(a), InvalidAnalysisParams(b)) => a == b,

            _ => false,
        }
    }
}
