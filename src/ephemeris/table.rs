//! Pre-exported spacecraft ephemeris, read from a CSV table.
//!
//! The table holds `datetime, x, y, z` rows with the spacecraft position already
//! expressed in the JSS frame, in kilometers. Positions between rows are linearly
//! interpolated; epochs outside the table are an error.
use camino::Utf8Path;
use hifitime::Epoch;
use nalgebra::Vector3;

use crate::{boundary_errors::BoundaryError, time::parse_timestamp};

#[derive(Debug, serde::Deserialize, PartialEq)]
struct TableRow {
    datetime: String,
    x: f64, // km
    y: f64, // km
    z: f64, // km
}

/// Time-sorted JSS positions of the spacecraft (km).
#[derive(Debug, Clone, PartialEq)]
pub struct EphemerisTable {
    epochs: Vec<Epoch>,
    positions: Vec<Vector3<f64>>,
}

impl EphemerisTable {
    /// Read the table from a CSV file with a `datetime,x,y,z` header.
    pub fn from_csv(path: &Utf8Path) -> Result<Self, BoundaryError> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut samples = Vec::new();
        for row in reader.deserialize::<TableRow>() {
            let row = row?;
            samples.push((parse_timestamp(&row.datetime)?, Vector3::new(row.x, row.y, row.z)));
        }
        Self::from_samples(samples, path.as_str())
    }

    /// Build the table from `(epoch, JSS position km)` samples in any order.
    ///
    /// Arguments
    /// -----------------
    /// * `samples`: at least two samples with distinct epochs.
    /// * `source`: name used in error messages.
    pub fn from_samples(
        mut samples: Vec<(Epoch, Vector3<f64>)>,
        source: &str,
    ) -> Result<Self, BoundaryError> {
        samples.sort_by(|a, b| a.0.cmp(&b.0));
        samples.dedup_by(|a, b| a.0 == b.0);
        if samples.len() < 2 {
            return Err(BoundaryError::EphemerisTableTooShort(source.to_string()));
        }

        let (epochs, positions) = samples.into_iter().unzip();
        Ok(EphemerisTable { epochs, positions })
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    /// First and last epochs of the table.
    pub fn span(&self) -> (Epoch, Epoch) {
        (self.epochs[0], self.epochs[self.epochs.len() - 1])
    }

    /// Linearly interpolated JSS position (km) at `epoch`.
    pub fn position_km(&self, epoch: Epoch) -> Result<Vector3<f64>, BoundaryError> {
        let (first, last) = self.span();
        if epoch < first || epoch > last {
            return Err(BoundaryError::OutsideEphemerisTable(epoch));
        }

        let upper = self.epochs.partition_point(|&t| t < epoch);
        if self.epochs[upper] == epoch {
            return Ok(self.positions[upper]);
        }

        let lower = upper - 1;
        let span = (self.epochs[upper] - self.epochs[lower]).to_seconds();
        let fraction = (epoch - self.epochs[lower]).to_seconds() / span;
        Ok(self.positions[lower].lerp(&self.positions[upper], fraction))
    }
}
