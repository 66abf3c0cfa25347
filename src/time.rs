//! Conversions between J2000 seconds and ISO-8601 timestamps.
//!
//! Simulation times are seconds past the J2000 epoch
//! (2000-01-01T11:58:55.816 UTC) on an atomic clock, so every leap second
//! inserted since the epoch counts as an elapsed second. Leap seconds
//! before 2000 are not counted. Conversions are exact inverses of each
//! other to the millisecond.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::FieldlinesError;

/// Unix timestamp (seconds) of the J2000 epoch.
pub const J2000_UNIX_SECONDS: f64 = 946_727_935.816;

/// Unix timestamps of the first UTC second after each leap second
/// inserted since J2000 (2006, 2009, mid 2012, mid 2015, 2017).
const LEAP_SECOND_UNIX_SECONDS: [f64; 5] = [
    1_136_073_600.0,
    1_230_768_000.0,
    1_341_100_800.0,
    1_435_708_800.0,
    1_483_228_800.0,
];

/// Leap seconds inserted between J2000 and the UTC instant `unix`.
fn leap_seconds_before_unix(unix: f64) -> f64 {
    LEAP_SECOND_UNIX_SECONDS
        .iter()
        .filter(|&&leap| unix >= leap)
        .count() as f64
}

/// Leap seconds inserted between J2000 and `seconds` past J2000.
fn leap_seconds_before_j2000(seconds: f64) -> f64 {
    LEAP_SECOND_UNIX_SECONDS
        .iter()
        .enumerate()
        .filter(|&(i, &leap)| seconds >= leap - J2000_UNIX_SECONDS + (i + 1) as f64)
        .count() as f64
}

const PARSE_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Parse an ISO-8601-like timestamp into J2000 seconds.
///
/// Accepts `YYYY-MM-DDTHH:MM:SS[.fff]`, the same with a space instead of
/// `T`, `YYYY-MM-DDTHH:MM`, and a bare `YYYY-MM-DD`. A trailing `Z` is
/// ignored. Leap seconds inserted since J2000 are added, so a time in 2017
/// or later is 5 s larger than its plain UTC difference from the epoch.
pub fn j2000_from_iso(text: &str) -> Result<f64, FieldlinesError> {
    let trimmed = text.trim();
    let trimmed = trimmed.strip_suffix('Z').unwrap_or(trimmed);

    let naive = PARSE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| {
            FieldlinesError::InvalidTime(format!("unrecognized timestamp '{trimmed}'"))
        })?;

    let utc = naive.and_utc();
    let unix = utc.timestamp() as f64 + f64::from(utc.timestamp_subsec_nanos()) * 1e-9;
    Ok(unix - J2000_UNIX_SECONDS + leap_seconds_before_unix(unix))
}

/// Format J2000 seconds as `YYYY-MM-DDTHH:MM:SS.mmm` UTC, removing the
/// leap seconds [`j2000_from_iso`] adds.
pub fn iso_from_j2000(seconds: f64) -> Result<String, FieldlinesError> {
    if !seconds.is_finite() {
        return Err(FieldlinesError::InvalidTime(format!(
            "{seconds} is not a finite time"
        )));
    }
    let unix = seconds + J2000_UNIX_SECONDS - leap_seconds_before_j2000(seconds);
    let millis = (unix * 1000.0).round() as i64;
    let datetime = DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        FieldlinesError::InvalidTime(format!("{seconds} s past J2000 is out of range"))
    })?;
    Ok(datetime.format("%Y-%m-%dT%H:%M:%S%.3f").to_string())
}

/// File-name-safe variant of [`iso_from_j2000`]: `YYYY-MM-DDTHH-MM-SS-mmm`.
pub fn path_safe_iso(seconds: f64) -> Result<String, FieldlinesError> {
    Ok(iso_from_j2000(seconds)?.replace([':', '.'], "-"))
}
