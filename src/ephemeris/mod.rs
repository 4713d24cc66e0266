//! Spacecraft trajectory in the JSS frame.
//!
//! The trajectory comes either from NAIF SPK kernels ([`KernelPool`]) or from a
//! pre-exported table of JSS positions ([`EphemerisTable`]). Both are wrapped by
//! [`SpacecraftEphemeris`], which returns positions in Jovian radii.
use camino::Utf8Path;
use hifitime::Epoch;
use log::info;
use nalgebra::Vector3;

use crate::{
    boundary_errors::BoundaryError,
    constants::{JUPITER_RADIUS_KM, NAIF_JUNO, NAIF_JUPITER, NAIF_SUN},
    coordinates::CylindricalSolar,
};

pub mod jss_frame;
pub mod naif;
pub mod table;

use jss_frame::jss_rotation;
use naif::KernelPool;
use table::EphemerisTable;

/// One spacecraft position of the hourly ephemeris.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EphemerisSample {
    pub epoch: Epoch,
    /// JSS position, R_J
    pub position: Vector3<f64>,
    pub coordinates: CylindricalSolar,
}

#[derive(Debug, Clone)]
pub enum SpacecraftEphemeris {
    Kernels(KernelPool),
    Table(EphemerisTable),
}

impl SpacecraftEphemeris {
    /// Kernels listed by a meta-kernel.
    pub fn from_metakernel(path: &Utf8Path) -> Result<Self, BoundaryError> {
        let pool = KernelPool::from_metakernel(path)?;
        info!(
            "Loaded {} SPK segments from {} kernels listed in {path}",
            pool.segment_count(),
            pool.kernels().len()
        );
        Ok(SpacecraftEphemeris::Kernels(pool))
    }

    /// Kernels listed by several meta-kernels, then explicit SPK files.
    ///
    /// Arguments
    /// -----------------
    /// * `metakernels`: loaded in order, e.g. the planetary meta-kernel then the Juno one.
    /// * `kernels`: SPK files loaded last, so their segments take precedence.
    pub fn from_kernel_sets<M, K>(metakernels: &[M], kernels: &[K]) -> Result<Self, BoundaryError>
    where
        M: AsRef<Utf8Path>,
        K: AsRef<Utf8Path>,
    {
        let mut pool = KernelPool::from_metakernels(metakernels)?;
        pool.furnish(kernels)?;
        info!(
            "Loaded {} SPK segments from {} kernels ({} meta-kernels)",
            pool.segment_count(),
            pool.kernels().len(),
            metakernels.len()
        );
        Ok(SpacecraftEphemeris::Kernels(pool))
    }

    /// Explicit list of SPK kernels, later files taking precedence.
    pub fn from_kernels<P: AsRef<Utf8Path>>(paths: &[P]) -> Result<Self, BoundaryError> {
        let pool = KernelPool::load(paths)?;
        info!(
            "Loaded {} SPK segments from {} kernels",
            pool.segment_count(),
            pool.kernels().len()
        );
        Ok(SpacecraftEphemeris::Kernels(pool))
    }

    pub fn from_table(path: &Utf8Path) -> Result<Self, BoundaryError> {
        let table = EphemerisTable::from_csv(path)?;
        info!("Loaded {} ephemeris rows from {path}", table.len());
        Ok(SpacecraftEphemeris::Table(table))
    }

    /// Geometric position of the spacecraft in the JSS frame, in R_J.
    ///
    /// Arguments
    /// -----------------
    /// * `epoch`: observation epoch (any time scale, converted to ET for the kernels).
    ///
    /// Return
    /// ----------
    /// * The JSS position in Jovian radii, or a coverage error for the epoch.
    pub fn jss_position(&self, epoch: Epoch) -> Result<Vector3<f64>, BoundaryError> {
        match self {
            SpacecraftEphemeris::Kernels(pool) => {
                let et = epoch.to_et_seconds();
                let sun = pool.position(NAIF_SUN, NAIF_JUPITER, et)?;
                let spacecraft = pool.position(NAIF_JUNO, NAIF_JUPITER, et)?;
                Ok(jss_rotation(&sun, et)? * spacecraft / JUPITER_RADIUS_KM)
            }
            SpacecraftEphemeris::Table(table) => {
                Ok(table.position_km(epoch)? / JUPITER_RADIUS_KM)
            }
        }
    }

    /// Spacecraft ephemeris at each epoch of `span`, in order.
    pub fn ephemeris_over(&self, span: &[Epoch]) -> Result<Vec<EphemerisSample>, BoundaryError> {
        span.iter()
            .map(|&epoch| {
                let position = self.jss_position(epoch)?;
                Ok(EphemerisSample {
                    epoch,
                    position,
                    coordinates: CylindricalSolar::from_cartesian(&position)?,
                })
            })
            .collect()
    }
}
