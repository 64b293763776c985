//! Timestamp parsing and date/time windows.
//!
//! All timestamps are naive UTC, truncated to the minute: uploads are minute
//! bars and every key in storage is a minute.

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::constants::{SESSION_CLOSE_UTC, SESSION_OPEN_UTC};
use crate::error::{CoreError, Result};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%Y/%m/%d"];

/// Drop seconds and sub-seconds.
pub fn truncate_to_minute(ts: NaiveDateTime) -> NaiveDateTime {
    ts.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(ts)
}

fn parse_epoch_seconds(raw: &str) -> Option<NaiveDateTime> {
    let secs = if let Ok(secs) = raw.parse::<i64>() {
        secs
    } else {
        let float = raw.parse::<f64>().ok()?;
        if !float.is_finite() || float.fract() != 0.0 {
            return None;
        }
        // Whole-second floats such as "1700000000.0" written by spreadsheet exports.
        #[allow(clippy::cast_possible_truncation, reason = "checked integral above")]
        let secs = float as i64;
        secs
    };
    DateTime::from_timestamp(secs, 0).map(|dt| dt.naive_utc())
}

/// Parse a datetime in any of the accepted textual forms, or integer epoch seconds.
///
/// The result is truncated to the minute.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.len() >= 9 && raw.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        if let Some(ts) = parse_epoch_seconds(raw) {
            return Some(truncate_to_minute(ts));
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(truncate_to_minute(dt.naive_utc()));
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(truncate_to_minute)
}

/// [`parse_datetime`] with a field-tagged error.
pub fn parse_minute(field: &'static str, raw: &str) -> Result<NaiveDateTime> {
    parse_datetime(raw).ok_or_else(|| CoreError::invalid(field, raw, "unrecognized timestamp"))
}

/// Parse a calendar date (`YYYY-MM-DD`, `DD-MM-YYYY` or `YYYY/MM/DD`).
pub fn parse_date(field: &'static str, raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| CoreError::invalid(field, raw, "unrecognized date"))
}

/// Parse a time of day given as `HH:MM`, `HH:MM:SS`, or a full datetime.
pub fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
        .or_else(|| parse_datetime(raw).map(|ts| ts.time()))
        .and_then(|t| t.with_second(0))
}

/// `HH:MM` label used on chart axes and the time slider.
pub fn minute_label(ts: NaiveDateTime) -> String {
    ts.format("%H:%M").to_string()
}

/// Inclusive time-of-day window, UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self> {
        if start > end {
            return Err(CoreError::invalid(
                "time_window",
                format!("{start}..{end}"),
                "start is after end",
            ));
        }
        Ok(Self { start, end })
    }

    /// Missing bounds default to the start and the last second of the day.
    pub fn between(start: Option<NaiveTime>, end: Option<NaiveTime>) -> Result<Self> {
        let last_second = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
        Self::new(start.unwrap_or(NaiveTime::MIN), end.unwrap_or(last_second))
    }

    /// The regular US equity session, 13:30–20:15 UTC.
    pub fn regular_session() -> Self {
        let (oh, om) = SESSION_OPEN_UTC;
        let (ch, cm) = SESSION_CLOSE_UTC;
        Self {
            start: NaiveTime::from_hms_opt(oh, om, 0).unwrap_or(NaiveTime::MIN),
            end: NaiveTime::from_hms_opt(ch, cm, 0).unwrap_or(NaiveTime::MIN),
        }
    }

    pub fn contains(&self, t: NaiveTime) -> bool {
        self.start <= t && t <= self.end
    }
}

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(CoreError::invalid(
                "date_range",
                format!("{start}..{end}"),
                "start is after end",
            ));
        }
        Ok(Self { start, end })
    }

    pub const fn single(day: NaiveDate) -> Self {
        Self { start: day, end: day }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Half-open timestamp bounds `[start 00:00, end + 1 day 00:00)` for SQL filters.
    pub fn bounds(&self) -> (NaiveDateTime, NaiveDateTime) {
        let lower = self.start.and_time(NaiveTime::MIN);
        let upper = self
            .end
            .checked_add_days(Days::new(1))
            .map_or(NaiveDateTime::MAX, |d| d.and_time(NaiveTime::MIN));
        (lower, upper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn parses_iso_and_day_first_forms() {
        let expected = dt("2024-03-15 14:31:00");
        for raw in [
            "2024-03-15 14:31:00",
            "2024-03-15 14:31",
            "2024-03-15T14:31:00",
            "2024-03-15T14:31:00Z",
            "2024-03-15T14:31:00+00:00",
            "15-03-2024 14:31",
            "2024-03-15 14:31:42.5",
        ] {
            assert_eq!(parse_datetime(raw), Some(expected), "{raw}");
        }
    }

    #[test]
    fn parses_epoch_seconds_and_truncates() {
        // 2024-03-15 14:31:27 UTC
        assert_eq!(parse_datetime("1710513087"), Some(dt("2024-03-15 14:31:00")));
        assert_eq!(parse_datetime("1710513060.0"), Some(dt("2024-03-15 14:31:00")));
    }

    #[test]
    fn rfc3339_offsets_are_converted_to_utc() {
        assert_eq!(parse_datetime("2024-03-15T10:31:00-04:00"), Some(dt("2024-03-15 14:31:00")));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_datetime(""), None);
        assert_eq!(parse_datetime("yesterday"), None);
        assert!(parse_minute("datetime_UTC", "2024-13-45").is_err());
    }

    #[test]
    fn parses_dates() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(parse_date("EXPIRY_DATE", "2024-03-15").unwrap(), d);
        assert_eq!(parse_date("EXPIRY_DATE", "15-03-2024").unwrap(), d);
        assert!(parse_date("EXPIRY_DATE", "03/15/2024").is_err());
    }

    #[test]
    fn parses_time_of_day() {
        let t = NaiveTime::from_hms_opt(14, 31, 0).unwrap();
        assert_eq!(parse_time_of_day("14:31"), Some(t));
        assert_eq!(parse_time_of_day("14:31:59"), Some(t));
        assert_eq!(parse_time_of_day("2024-03-15 14:31"), Some(t));
        assert_eq!(parse_time_of_day("noon"), None);
    }

    #[test]
    fn session_window_is_inclusive() {
        let session = TimeWindow::regular_session();
        assert!(session.contains(NaiveTime::from_hms_opt(13, 30, 0).unwrap()));
        assert!(session.contains(NaiveTime::from_hms_opt(20, 15, 0).unwrap()));
        assert!(!session.contains(NaiveTime::from_hms_opt(13, 29, 0).unwrap()));
        assert!(!session.contains(NaiveTime::from_hms_opt(20, 16, 0).unwrap()));
    }

    #[test]
    fn open_ended_windows_cover_the_rest_of_the_day() {
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        let from_two = TimeWindow::between(Some(t(14, 0)), None).unwrap();
        assert!(from_two.contains(t(23, 59)));
        assert!(!from_two.contains(t(13, 59)));
        let until_two = TimeWindow::between(None, Some(t(14, 0))).unwrap();
        assert!(until_two.contains(t(0, 0)));
        assert!(TimeWindow::between(Some(t(15, 0)), Some(t(14, 0))).is_err());
    }

    #[test]
    fn date_range_bounds_are_half_open() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let (lo, hi) = DateRange::single(d).bounds();
        assert_eq!(lo, dt("2024-03-15 00:00:00"));
        assert_eq!(hi, dt("2024-03-16 00:00:00"));
        assert!(DateRange::new(d, d.pred_opt().unwrap()).is_err());
    }
}
