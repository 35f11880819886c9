use fxhash::FxHashMap;
use serde::Serialize;
use std::ops::Range;
use time::macros::{datetime, format_description};
use time::{Duration, OffsetDateTime, PrimitiveDateTime};

use super::error::HeaderError;

/// The instrument clock counts seconds from this epoch
pub const CLOCK_EPOCH: OffsetDateTime = datetime!(2000-01-01 0:00 UTC);

/// Parse an instrument date/time of the form `01 Mar 2018 13:54:14`.
///
/// Runs of whitespace are collapsed first; the firmware pads these fields inconsistently.
/// Times are interpreted as UTC.
pub fn parse_instrument_datetime(text: &str) -> Result<OffsetDateTime, HeaderError> {
    let format = format_description!("[day] [month repr:short] [year] [hour]:[minute]:[second]");
    let normalized = text.split_whitespace().collect::<Vec<&str>>().join(" ");
    match PrimitiveDateTime::parse(&normalized, format) {
        Ok(dt) => Ok(dt.assume_utc()),
        Err(_) => Err(HeaderError::BadDateTime(text.to_string())),
    }
}

/// Convert a value from the clock column into a timestamp
pub fn sample_time(seconds: f64) -> OffsetDateTime {
    CLOCK_EPOCH + Duration::seconds_f64(seconds)
}

/// End time from the banner line. Kept raw if the firmware wrote something unparseable.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderTimestamp {
    Parsed(OffsetDateTime),
    Raw(String),
}

/// Calibration of one external voltage channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VoltageCalibration {
    pub offset: f64,
    pub slope: f64,
}

impl VoltageCalibration {
    pub fn apply(&self, raw: f64) -> f64 {
        raw * self.slope + self.offset
    }
}

/// One cast (deployment) recorded by the instrument.
///
/// Sample indices are 1-based and inclusive, as the instrument reports them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CastRecord {
    pub cast_number: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    pub start_sample: usize,
    pub end_sample: usize,
    pub average_count: usize,
}

impl CastRecord {
    /// Rows of the decoded table belonging to this cast, clamped to the number of rows
    pub fn row_range(&self, n_rows: usize) -> Range<usize> {
        let start = self.start_sample.saturating_sub(1).min(n_rows);
        let end = self.end_sample.min(n_rows).max(start);
        start..end
    }
}

/// Instrument configuration built from the header lines.
///
/// Owned by the header parser until the end-of-header marker, then read-only.
#[derive(Debug, Clone, Default)]
pub struct InstrumentConfig {
    pub serial_number: Option<String>,
    pub end_date_time: Option<HeaderTimestamp>,
    pub sample_count: usize,
    pub mode: String,
    pub pump_delay_seconds: f64,
    pub pressure_sensor_info: FxHashMap<String, String>,
    pub extra_sensor_flags: FxHashMap<String, bool>,
    pub voltage_channel_flags: FxHashMap<String, bool>,
    pub voltage_offsets: FxHashMap<String, VoltageCalibration>,
    pub casts: Vec<CastRecord>,
}
