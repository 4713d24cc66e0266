//! # Probability map
//!
//! Per-bin densities stacked into a 3-D array indexed `[rho][phi][ell]` and
//! flattened to the rows of the output table. The flattening is row-major: `rho`
//! varies slowest and `ell` fastest, so the file reads
//!
//! ```text
//! density,rho,phi,ell
//! d[0][0][0],50.0,-1.5707963267948966,-115.0
//! d[0][0][1],50.0,-1.5707963267948966,-105.0
//! ...
//! ```
//!
//! `phi` and `ell` are the reference values (midpoints) of the bins.
use std::fs::File;

use camino::Utf8Path;
use log::info;
use serde::Serialize;

use crate::{binning::SpatialBin, boundary_errors::BoundaryError, grid::RadialGrid};

/// One line of the output table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DensityRow {
    pub density: f64,
    pub rho: f64,
    pub phi: f64,
    pub ell: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityMap {
    rho: Vec<f64>,
    phi: Vec<f64>,
    ell: Vec<f64>,
    /// Flat `[n_rho][n_phi][n_ell]` array.
    density: Vec<f64>,
}

impl ProbabilityMap {
    /// Stack the densities of the bins.
    ///
    /// Arguments
    /// -----------------
    /// * `bins`: every bin of the grid, elevation-major as produced by
    ///   [`crate::binning::BinGrid::partition`].
    /// * `grid`: radial grid the densities were evaluated on.
    /// * `n_phi`, `n_ell`: grid shape.
    ///
    /// Return
    /// ----------
    /// * The map. A bin with an empty density contributes zeros. A bin count or a
    ///   density length that does not match the shape is an
    ///   [`BoundaryError::InvalidAnalysisParams`].
    pub fn assemble(
        bins: &[SpatialBin],
        grid: &RadialGrid,
        n_phi: usize,
        n_ell: usize,
    ) -> Result<Self, BoundaryError> {
        if bins.len() != n_phi * n_ell {
            return Err(BoundaryError::InvalidAnalysisParams(format!(
                "{} bins cannot fill a {n_phi} x {n_ell} map",
                bins.len()
            )));
        }

        let n_rho = grid.len();
        let mut phi = vec![0.0; n_phi];
        let mut ell = vec![0.0; n_ell];
        let mut density = vec![0.0; n_rho * n_phi * n_ell];

        for bin in bins {
            let (i_ell, i_phi) = (bin.index.ell, bin.index.phi);
            if i_ell >= n_ell || i_phi >= n_phi {
                return Err(BoundaryError::InvalidAnalysisParams(format!(
                    "bin {} lies outside a {n_phi} x {n_ell} map",
                    bin.index
                )));
            }
            phi[i_phi] = bin.phi_ref();
            ell[i_ell] = bin.ell_ref();

            if bin.density.is_empty() {
                continue;
            }
            if bin.density.len() != n_rho {
                return Err(BoundaryError::InvalidAnalysisParams(format!(
                    "bin {} has {} density values for a grid of {n_rho} radii",
                    bin.index,
                    bin.density.len()
                )));
            }
            for (i_rho, &value) in bin.density.iter().enumerate() {
                density[(i_rho * n_phi + i_phi) * n_ell + i_ell] = value;
            }
        }

        Ok(ProbabilityMap {
            rho: grid.points().to_vec(),
            phi,
            ell,
            density,
        })
    }

    /// `(n_rho, n_phi, n_ell)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.rho.len(), self.phi.len(), self.ell.len())
    }

    pub fn get(&self, i_rho: usize, i_phi: usize, i_ell: usize) -> Option<f64> {
        let (n_rho, n_phi, n_ell) = self.shape();
        if i_rho >= n_rho || i_phi >= n_phi || i_ell >= n_ell {
            return None;
        }
        Some(self.density[(i_rho * n_phi + i_phi) * n_ell + i_ell])
    }

    /// Rows in row-major order, `rho` slowest and `ell` fastest.
    pub fn rows(&self) -> impl Iterator<Item = DensityRow> + '_ {
        let (_, n_phi, n_ell) = self.shape();
        self.density.iter().enumerate().map(move |(k, &density)| DensityRow {
            density,
            rho: self.rho[k / (n_phi * n_ell)],
            phi: self.phi[(k / n_ell) % n_phi],
            ell: self.ell[k % n_ell],
        })
    }

    /// Write the map as `density,rho,phi,ell` rows, without index column.
    pub fn write_csv(&self, path: &Utf8Path) -> Result<(), BoundaryError> {
        let mut writer = csv::Writer::from_writer(File::create(path)?);
        for row in self.rows() {
            writer.serialize(row)?;
        }
        writer.flush()?;
        info!("Wrote {} density rows to {path}", self.density.len());
        Ok(())
    }
}
