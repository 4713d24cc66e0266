//! Hourly solar-wind dynamic pressure, as propagated to Jupiter by an ensemble model.
//!
//! Two layouts are read. The multi-model output has a two-row column header,
//! model name first and variable second, with the timestamp in the first column:
//!
//! ```text
//! ,ensemble,ensemble,ensemble,tao,...
//! datetime,p_dyn,p_dyn_neg_unc,p_dyn_pos_unc,p_dyn,...
//! 2016-06-24 23:00:00,0.071,0.032,0.104,0.09,...
//! ```
//!
//! The long layout has one header row and an optional `model` column:
//!
//! ```text
//! datetime,model,p_dyn,p_dyn_neg_unc,p_dyn_pos_unc
//! 2016-06-24 23:00:00,ensemble,0.071,0.032,0.104
//! ```
//!
//! In both, only the `ensemble` estimates are kept; the constituent models of the
//! ensemble are ignored.
use std::collections::HashMap;

use camino::Utf8Path;
use csv::{ReaderBuilder, StringRecord, StringRecordsIter};
use hifitime::Epoch;
use log::debug;

use crate::{
    boundary_errors::BoundaryError,
    constants::NanoPascal,
    time::{hour_key, parse_timestamp},
};

/// Model name selected from multi-model files.
pub const ENSEMBLE_MODEL: &str = "ensemble";

/// Variables read for each hour, in [`DynamicPressure`] field order.
const PRESSURE_COLUMNS: [&str; 3] = ["p_dyn", "p_dyn_neg_unc", "p_dyn_pos_unc"];

/// Solar-wind dynamic pressure with its asymmetric uncertainty (nPa).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicPressure {
    pub p_dyn: NanoPascal,
    pub neg_unc: NanoPascal,
    pub pos_unc: NanoPascal,
}

impl DynamicPressure {
    /// `(p_dyn - neg_unc, p_dyn + pos_unc)`
    pub fn interval(&self) -> (NanoPascal, NanoPascal) {
        (self.p_dyn - self.neg_unc, self.p_dyn + self.pos_unc)
    }
}

/// What to do with a crossing whose hour is absent from the solar-wind series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingPolicy {
    /// Fail with [`BoundaryError::MissingSolarWind`].
    #[default]
    Error,
    /// Leave the crossing without pressure.
    Skip,
}

#[derive(Debug, serde::Deserialize)]
struct SolarWindRow {
    datetime: String,
    #[serde(default)]
    model: Option<String>,
    p_dyn: f64,
    p_dyn_neg_unc: f64,
    p_dyn_pos_unc: f64,
}

/// Hourly series of dynamic pressure, keyed by UTC hour.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolarWindSeries {
    hours: HashMap<i64, DynamicPressure>,
}

impl SolarWindSeries {
    /// Read the ensemble estimates of a solar-wind CSV file.
    ///
    /// Arguments
    /// -----------------
    /// * `path`: CSV file in the multi-model layout (two header rows) or in the long
    ///   layout (`datetime, p_dyn, p_dyn_neg_unc, p_dyn_pos_unc` and an optional
    ///   `model` column).
    ///
    /// Return
    /// ----------
    /// * The series, or a CSV / timestamp error. When an hour appears twice, the last
    ///   row wins.
    pub fn from_csv(path: &Utf8Path) -> Result<Self, BoundaryError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;
        let first = match reader.records().next() {
            Some(record) => record?,
            None => return Ok(SolarWindSeries::default()),
        };

        // the first header row of the multi-model layout names models, not variables
        let is_model_header = first.iter().any(is_ensemble)
            && !first.iter().any(|cell| PRESSURE_COLUMNS.contains(&cell.trim()));
        if is_model_header {
            Self::from_model_columns(path)
        } else {
            Self::from_model_rows(path)
        }
    }

    /// Multi-model layout: pick the `(ensemble, variable)` columns.
    fn from_model_columns(path: &Utf8Path) -> Result<Self, BoundaryError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;
        let mut records = reader.records();
        let models = next_header(&mut records, path)?;
        let variables = next_header(&mut records, path)?;

        let mut columns = [0usize; 3];
        for (column, variable) in columns.iter_mut().zip(PRESSURE_COLUMNS) {
            *column = models
                .iter()
                .zip(variables.iter())
                .position(|(model, name)| is_ensemble(model) && name.trim() == variable)
                .ok_or_else(|| {
                    BoundaryError::InvalidSolarWindFile(format!(
                        "{path}: no ({ENSEMBLE_MODEL}, {variable}) column"
                    ))
                })?;
        }

        let mut series = SolarWindSeries::default();
        let mut skipped = 0usize;
        for record in records {
            let record = record?;
            let datetime = record.get(0).unwrap_or("").trim();
            // pandas writes the index name on a row of its own
            if datetime.is_empty() || record.iter().skip(1).all(|cell| cell.trim().is_empty()) {
                skipped += 1;
                continue;
            }
            let epoch = parse_timestamp(datetime)?;

            let mut values = [0.0; 3];
            let mut complete = true;
            for (value, &column) in values.iter_mut().zip(&columns) {
                let cell = record.get(column).unwrap_or("").trim();
                if cell.is_empty() || cell.eq_ignore_ascii_case("nan") {
                    complete = false;
                    break;
                }
                *value = cell.parse().map_err(|_| {
                    BoundaryError::InvalidSolarWindFile(format!(
                        "{path}: {cell:?} in column {column} of {datetime} is not a number"
                    ))
                })?;
            }
            if !complete {
                skipped += 1;
                continue;
            }

            let [p_dyn, neg_unc, pos_unc] = values;
            series.insert(
                epoch,
                DynamicPressure {
                    p_dyn,
                    neg_unc,
                    pos_unc,
                },
            );
        }

        debug!(
            "Read {} hourly ensemble estimates from {path} ({skipped} incomplete rows skipped)",
            series.len()
        );
        Ok(series)
    }

    /// Long layout: one row per hour and model.
    fn from_model_rows(path: &Utf8Path) -> Result<Self, BoundaryError> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut series = SolarWindSeries::default();
        let mut skipped = 0usize;

        for row in reader.deserialize::<SolarWindRow>() {
            let row = row?;
            let keep = row
                .model
                .as_deref()
                .is_none_or(|model| model.trim().is_empty() || is_ensemble(model));
            if !keep {
                skipped += 1;
                continue;
            }
            series.insert(
                parse_timestamp(&row.datetime)?,
                DynamicPressure {
                    p_dyn: row.p_dyn,
                    neg_unc: row.p_dyn_neg_unc,
                    pos_unc: row.p_dyn_pos_unc,
                },
            );
        }

        debug!(
            "Read {} hourly solar wind estimates from {path} ({skipped} non-ensemble rows skipped)",
            series.len()
        );
        Ok(series)
    }

    /// Store the pressure of the hour containing `epoch`.
    pub fn insert(&mut self, epoch: Epoch, pressure: DynamicPressure) {
        self.hours.insert(hour_key(epoch), pressure);
    }

    /// Pressure of the UTC hour containing `epoch`.
    pub fn pressure_at(&self, epoch: Epoch) -> Option<DynamicPressure> {
        self.hours.get(&hour_key(epoch)).copied()
    }

    pub fn len(&self) -> usize {
        self.hours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hours.is_empty()
    }
}

fn is_ensemble(model: &str) -> bool {
    model.trim().eq_ignore_ascii_case(ENSEMBLE_MODEL)
}

fn next_header<R: std::io::Read>(
    records: &mut StringRecordsIter<'_, R>,
    path: &Utf8Path,
) -> Result<StringRecord, BoundaryError> {
    match records.next() {
        Some(record) => Ok(record?),
        None => Err(BoundaryError::InvalidSolarWindFile(format!(
            "{path}: truncated two-row header"
        ))),
    }
}
