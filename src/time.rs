use hifitime::{Epoch, TimeSeries, Unit};

use crate::{boundary_errors::BoundaryError, constants::EtSeconds};

/// Parse a UTC timestamp as written by the crossing lists and the solar wind files.
///
/// Accepts `YYYY-MM-DDTHH:MM:SS[.fff]` and the space separated form
/// `YYYY-MM-DD HH:MM:SS[.fff]`. Timestamps without an explicit time scale are UTC.
///
/// Arguments
/// -----------------
/// * `date`: the timestamp string
///
/// Return
/// ----------
/// * the parsed epoch, or [`BoundaryError::InvalidTimestamp`]
pub fn parse_timestamp(date: &str) -> Result<Epoch, BoundaryError> {
    let trimmed = date.trim();
    let normalized = match trimmed.split_once(' ') {
        Some((day, clock)) if !clock.trim().is_empty() && clock.trim().as_bytes()[0].is_ascii_digit() => {
            format!("{day}T{}", clock.trim())
        }
        _ => trimmed.to_string(),
    };

    Epoch::from_gregorian_str(&normalized)
        .map_err(|e| BoundaryError::InvalidTimestamp(format!("{date}: {e}")))
}

/// Truncate an epoch to the start of its UTC hour.
pub fn floor_to_hour(epoch: Epoch) -> Epoch {
    let (year, month, day, hour, _, _, _) = epoch.to_gregorian_utc();
    Epoch::from_gregorian_utc_hms(year, month, day, hour, 0, 0)
}

/// Stable integer key of the UTC hour containing `epoch`, for hourly lookups.
pub fn hour_key(epoch: Epoch) -> i64 {
    (floor_to_hour(epoch).to_unix_seconds() / 3600.0).round() as i64
}

/// Hourly epochs enclosing `[earliest, latest]`.
///
/// The series starts at the hour of `earliest` and stops before the hour of
/// `latest` plus two hours, so the last crossing is always bracketed by samples.
pub fn hourly_span(earliest: Epoch, latest: Epoch) -> Vec<Epoch> {
    let start = floor_to_hour(earliest);
    let end = floor_to_hour(latest) + Unit::Hour * 2;
    TimeSeries::exclusive(start, end, Unit::Hour * 1).collect()
}

/// Julian centuries (TDB) since J2000 of an ET epoch.
pub fn centuries_since_j2000(et_seconds: EtSeconds) -> f64 {
    use crate::constants::{DAYS_PER_JULIAN_CENTURY, SECONDS_PER_DAY};
    et_seconds / (SECONDS_PER_DAY * DAYS_PER_JULIAN_CENTURY)
}
