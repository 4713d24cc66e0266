//! Boundary crossing observations.
//!
//! A combined crossing list is a CSV file with one row per crossing:
//!
//! ```text
//! datetime,boundary,x_JSS,y_JSS,z_JSS
//! 2016-06-24 23:10:00,BS,89.1,-62.3,7.9
//! ```
//!
//! Positions are JSS Cartesian coordinates in Jovian radii. The `boundary` column is
//! optional: without it, every row belongs to the requested boundary. Any other column
//! is ignored.
use std::{fmt, str::FromStr};

use camino::Utf8Path;
use hifitime::Epoch;
use log::{debug, warn};
use nalgebra::Vector3;

use crate::{
    boundary_errors::BoundaryError,
    coordinates::CylindricalSolar,
    solar_wind::{DynamicPressure, MissingPolicy, SolarWindSeries},
    time::parse_timestamp,
};

/// Magnetospheric boundary a crossing belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Boundary {
    BowShock,
    Magnetopause,
}

impl Boundary {
    /// Short label used in crossing lists (`BS`, `MP`).
    pub fn label(&self) -> &'static str {
        match self {
            Boundary::BowShock => "BS",
            Boundary::Magnetopause => "MP",
        }
    }

    /// Name of the density table written for this boundary.
    pub fn output_file_name(&self) -> &'static str {
        match self {
            Boundary::BowShock => "BowShock_Density.csv",
            Boundary::Magnetopause => "Magnetopause_Density.csv",
        }
    }
}

impl FromStr for Boundary {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "bs" | "bow_shock" | "bowshock" => Ok(Boundary::BowShock),
            "mp" | "magnetopause" => Ok(Boundary::Magnetopause),
            other => Err(format!("unknown boundary {other:?} (expected BS or MP)")),
        }
    }
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Boundary::BowShock => write!(f, "bow shock"),
            Boundary::Magnetopause => write!(f, "magnetopause"),
        }
    }
}

/// One observed boundary crossing.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossingRecord {
    pub epoch: Epoch,
    pub boundary: Boundary,
    /// JSS position, R_J
    pub position: Vector3<f64>,
    pub coordinates: CylindricalSolar,
    pub dynamic_pressure: Option<DynamicPressure>,
}

impl CrossingRecord {
    pub fn new(
        epoch: Epoch,
        boundary: Boundary,
        position: Vector3<f64>,
    ) -> Result<Self, BoundaryError> {
        Ok(CrossingRecord {
            epoch,
            boundary,
            position,
            coordinates: CylindricalSolar::from_cartesian(&position)?,
            dynamic_pressure: None,
        })
    }
}

#[derive(Debug, serde::Deserialize)]
struct CrossingRow {
    datetime: String,
    #[serde(default)]
    boundary: Option<String>,
    #[serde(rename = "x_JSS")]
    x: f64,
    #[serde(rename = "y_JSS")]
    y: f64,
    #[serde(rename = "z_JSS")]
    z: f64,
}

/// Time-ordered crossings of one boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossingList {
    boundary: Boundary,
    records: Vec<CrossingRecord>,
}

impl CrossingList {
    /// Build a list from records, keeping those of `boundary` and sorting them by epoch.
    pub fn from_records(boundary: Boundary, mut records: Vec<CrossingRecord>) -> Self {
        records.retain(|record| record.boundary == boundary);
        records.sort_by(|a, b| a.epoch.cmp(&b.epoch));
        CrossingList { boundary, records }
    }

    /// Read the crossings of `boundary` from a combined crossing list.
    ///
    /// Arguments
    /// -----------------
    /// * `path`: CSV file with `datetime, x_JSS, y_JSS, z_JSS` and optionally `boundary`.
    /// * `boundary`: boundary to keep.
    ///
    /// Return
    /// ----------
    /// * The sorted list, or a CSV, timestamp, or coordinate error. Rows with an
    ///   unrecognized `boundary` label are skipped with a warning.
    pub fn from_csv(path: &Utf8Path, boundary: Boundary) -> Result<Self, BoundaryError> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut records = Vec::new();

        for (line, row) in reader.deserialize::<CrossingRow>().enumerate() {
            let row = row?;
            let row_boundary = match row.boundary.as_deref().map(str::trim) {
                None | Some("") => boundary,
                Some(label) => match label.parse::<Boundary>() {
                    Ok(parsed) => parsed,
                    Err(reason) => {
                        warn!("{path}, row {}: {reason}, row skipped", line + 1);
                        continue;
                    }
                },
            };
            if row_boundary != boundary {
                continue;
            }

            records.push(CrossingRecord::new(
                parse_timestamp(&row.datetime)?,
                row_boundary,
                Vector3::new(row.x, row.y, row.z),
            )?);
        }

        debug!("Read {} {boundary} crossings from {path}", records.len());
        Ok(Self::from_records(boundary, records))
    }

    pub fn boundary(&self) -> Boundary {
        self.boundary
    }

    pub fn records(&self) -> &[CrossingRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn earliest(&self) -> Option<Epoch> {
        self.records.first().map(|record| record.epoch)
    }

    pub fn latest(&self) -> Option<Epoch> {
        self.records.last().map(|record| record.epoch)
    }

    /// Attach to every crossing the solar-wind pressure of its hour.
    ///
    /// Arguments
    /// -----------------
    /// * `series`: hourly solar-wind estimates.
    /// * `policy`: behavior for crossings whose hour is missing from `series`.
    ///
    /// Return
    /// ----------
    /// * The number of crossings left without pressure (always `0` under
    ///   [`MissingPolicy::Error`]), or [`BoundaryError::MissingSolarWind`] for the
    ///   first uncovered crossing.
    pub fn attach_solar_wind(
        &mut self,
        series: &SolarWindSeries,
        policy: MissingPolicy,
    ) -> Result<usize, BoundaryError> {
        let mut missing = 0;
        for record in &mut self.records {
            record.dynamic_pressure = series.pressure_at(record.epoch);
            if record.dynamic_pressure.is_none() {
                match policy {
                    MissingPolicy::Error => return Err(BoundaryError::MissingSolarWind(record.epoch)),
                    MissingPolicy::Skip => missing += 1,
                }
            }
        }

        if missing > 0 {
            warn!("{missing} crossings have no solar wind estimate");
        }
        Ok(missing)
    }
}

#[cfg(test)]
mod test_crossings {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;

    fn write_csv(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_boundary_labels() {
        assert_eq!("BS".parse::<Boundary>(), Ok(Boundary::BowShock));
        assert_eq!("bow shock".parse::<Boundary>(), Ok(Boundary::BowShock));
        assert_eq!("Magnetopause".parse::<Boundary>(), Ok(Boundary::Magnetopause));
        assert!("plasma sheet".parse::<Boundary>().is_err());
        assert_eq!(Boundary::Magnetopause.output_file_name(), "Magnetopause_Density.csv");
    }

    #[test]
    fn test_from_csv_filters_and_sorts() {
        let file = write_csv(&[
            "datetime,boundary,x_JSS,y_JSS,z_JSS,p_dyn,r_bs",
            "2016-07-01 12:00:00,BS,10.0,-30.0,40.0,0.1,80",
            "2016-06-24 23:10:00,BS,-20.0,0.0,-60.0,0.1,80",
            "2016-06-28 02:00:00,MP,5.0,5.0,5.0,0.1,80",
        ]);
        let path = Utf8Path::from_path(file.path()).unwrap();

        let bow_shock = CrossingList::from_csv(path, Boundary::BowShock).unwrap();
        assert_eq!(bow_shock.len(), 2);
        assert_eq!(
            bow_shock.earliest(),
            Some(Epoch::from_gregorian_utc_hms(2016, 6, 24, 23, 10, 0))
        );
        let last = &bow_shock.records()[1];
        assert_relative_eq!(last.coordinates.rho, 50.0);
        assert_relative_eq!(last.coordinates.ell, 10.0);
        assert!(last.coordinates.is_dawn());

        let magnetopause = CrossingList::from_csv(path, Boundary::Magnetopause).unwrap();
        assert_eq!(magnetopause.len(), 1);
    }

    #[test]
    fn test_from_csv_without_boundary_column() {
        let file = write_csv(&["datetime,x_JSS,y_JSS,z_JSS", "2016-06-24T23:10:00,1.0,2.0,3.0"]);
        let list =
            CrossingList::from_csv(Utf8Path::from_path(file.path()).unwrap(), Boundary::Magnetopause)
                .unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list.records()[0].boundary, Boundary::Magnetopause);
    }

    #[test]
    fn test_from_csv_bad_timestamp() {
        let file = write_csv(&["datetime,x_JSS,y_JSS,z_JSS", "yesterday,1.0,2.0,3.0"]);
        let result =
            CrossingList::from_csv(Utf8Path::from_path(file.path()).unwrap(), Boundary::BowShock);
        assert!(matches!(result, Err(BoundaryError::InvalidTimestamp(_))));
    }

    #[test]
    fn test_attach_solar_wind() {
        let t = Epoch::from_gregorian_utc_hms(2016, 6, 24, 23, 10, 0);
        let records = vec![
            CrossingRecord::new(t, Boundary::BowShock, Vector3::new(1.0, 2.0, 3.0)).unwrap(),
            CrossingRecord::new(
                Epoch::from_gregorian_utc_hms(2016, 6, 26, 0, 0, 0),
                Boundary::BowShock,
                Vector3::new(1.0, 2.0, 3.0),
            )
            .unwrap(),
        ];
        let pressure = DynamicPressure {
            p_dyn: 0.07,
            neg_unc: 0.03,
            pos_unc: 0.1,
        };
        let mut series = SolarWindSeries::default();
        series.insert(t, pressure);

        let mut strict = CrossingList::from_records(Boundary::BowShock, records.clone());
        assert_eq!(
            strict.attach_solar_wind(&series, MissingPolicy::Error),
            Err(BoundaryError::MissingSolarWind(Epoch::from_gregorian_utc_hms(
                2016, 6, 26, 0, 0, 0
            )))
        );

        let mut lenient = CrossingList::from_records(Boundary::BowShock, records);
        assert_eq!(lenient.attach_solar_wind(&series, MissingPolicy::Skip), Ok(1));
        assert_eq!(lenient.records()[0].dynamic_pressure, Some(pressure));
        assert_eq!(lenient.records()[1].dynamic_pressure, None);
    }
}
