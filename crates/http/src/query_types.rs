//! Request/query types (Deserialize) and their validated forms.

use chrono::{NaiveDate, NaiveTime};
use optchain_core::{
    DEFAULT_STRIKE_STEPS, DatasetKind, DateRange, Dte, MAX_QUERY_LIMIT, PREVIEW_ROWS, TimeWindow,
    parse_date, parse_time_of_day,
};
use optchain_service::{Compare, OptionFilter};
use serde::Deserialize;

use crate::api_error::ApiError;

const fn default_limit() -> usize {
    PREVIEW_ROWS
}

fn non_empty(raw: Option<&String>) -> Option<&str> {
    raw.map(|s| s.trim()).filter(|s| !s.is_empty())
}

#[derive(Debug, Default, Deserialize)]
pub struct PreviewQuery {
    pub dataset: Option<String>,
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl PreviewQuery {
    /// Cap limit to prevent unbounded queries.
    pub fn capped_limit(&self) -> usize {
        self.limit.clamp(1, MAX_QUERY_LIMIT)
    }

    pub fn dataset(&self) -> Result<DatasetKind, ApiError> {
        let dataset = non_empty(self.dataset.as_ref()).map(str::parse::<DatasetKind>).transpose()?;
        Ok(dataset.unwrap_or(DatasetKind::Index))
    }
}

/// `date`, `time`, `expiry`, `steps` and `compare`, all optional.
///
/// Numbers arrive as strings so that bad values produce a JSON 400 naming
/// the parameter.
#[derive(Debug, Default, Deserialize)]
pub struct ChainQuery {
    pub date: Option<String>,
    pub time: Option<String>,
    pub expiry: Option<String>,
    pub steps: Option<String>,
    pub compare: Option<String>,
}

/// A [`ChainQuery`] after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainParams {
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub dte: Dte,
    pub steps: u32,
    pub compare: Compare,
}

impl ChainQuery {
    pub fn validate(&self) -> Result<ChainParams, ApiError> {
        let date = non_empty(self.date.as_ref()).map(|raw| parse_date("date", raw)).transpose()?;
        let dte =
            non_empty(self.expiry.as_ref()).map(str::parse::<Dte>).transpose()?.unwrap_or_default();
        let steps = match non_empty(self.steps.as_ref()) {
            Some(raw) => raw.parse::<u32>().map_err(|_| {
                ApiError::BadRequest(format!("invalid steps: {raw:?} (expected a whole number)"))
            })?,
            None => DEFAULT_STRIKE_STEPS,
        };
        let compare = non_empty(self.compare.as_ref())
            .map(str::parse::<Compare>)
            .transpose()?
            .unwrap_or_default();
        Ok(ChainParams {
            date,
            time: non_empty(self.time.as_ref()).map(ToOwned::to_owned),
            dte,
            steps,
            compare,
        })
    }
}

/// Filters for the raw row endpoints: `date` (required), `end_date`,
/// `start`/`end` as `HH:MM`, `expiry`, `min_strike`, `max_strike`.
#[derive(Debug, Default, Deserialize)]
pub struct RowsQuery {
    pub date: Option<String>,
    pub end_date: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub expiry: Option<String>,
    pub min_strike: Option<String>,
    pub max_strike: Option<String>,
}

impl RowsQuery {
    fn date(&self) -> Result<NaiveDate, ApiError> {
        let raw = non_empty(self.date.as_ref())
            .ok_or_else(|| ApiError::BadRequest("date is required".to_owned()))?;
        Ok(parse_date("date", raw)?)
    }

    /// `date..=end_date`, a single day when `end_date` is absent.
    pub fn date_range(&self) -> Result<DateRange, ApiError> {
        let start = self.date()?;
        match non_empty(self.end_date.as_ref()) {
            Some(raw) => Ok(DateRange::new(start, parse_date("end_date", raw)?)?),
            None => Ok(DateRange::single(start)),
        }
    }

    pub fn option_filter(&self) -> Result<(NaiveDate, OptionFilter), ApiError> {
        let date = self.date()?;
        let start = time_param("start", self.start.as_ref())?;
        let end = time_param("end", self.end.as_ref())?;
        let window = if start.is_none() && end.is_none() {
            None
        } else {
            Some(TimeWindow::between(start, end)?)
        };
        let filter = OptionFilter {
            window,
            expiry: non_empty(self.expiry.as_ref()).map(|raw| parse_date("expiry", raw)).transpose()?,
            min_strike: strike_param("min_strike", self.min_strike.as_ref())?,
            max_strike: strike_param("max_strike", self.max_strike.as_ref())?,
        };
        Ok((date, filter))
    }
}

fn time_param(name: &str, raw: Option<&String>) -> Result<Option<NaiveTime>, ApiError> {
    non_empty(raw)
        .map(|raw| {
            parse_time_of_day(raw).ok_or_else(|| {
                ApiError::BadRequest(format!("invalid {name}: {raw:?} (expected HH:MM)"))
            })
        })
        .transpose()
}

fn strike_param(name: &str, raw: Option<&String>) -> Result<Option<f64>, ApiError> {
    non_empty(raw)
        .map(|raw| match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(ApiError::BadRequest(format!("invalid {name}: {raw:?} (not a number)"))),
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_query_defaults() {
        let params = ChainQuery::default().validate().unwrap();
        assert_eq!(params.date, None);
        assert_eq!(params.dte, Dte::Zero);
        assert_eq!(params.steps, DEFAULT_STRIKE_STEPS);
        assert_eq!(params.compare, Compare::All);
    }

    #[test]
    fn chain_query_rejects_bad_values() {
        let bad_date = ChainQuery { date: Some("yesterday".to_owned()), ..ChainQuery::default() };
        assert!(bad_date.validate().is_err());
        let bad_steps = ChainQuery { steps: Some("-3".to_owned()), ..ChainQuery::default() };
        assert!(bad_steps.validate().is_err());
        let bad_expiry = ChainQuery { expiry: Some("9DTE".to_owned()), ..ChainQuery::default() };
        assert!(bad_expiry.validate().is_err());
    }

    #[test]
    fn chain_query_parses_values() {
        let query = ChainQuery {
            date: Some("2024-03-01".to_owned()),
            time: Some(" 14:05 ".to_owned()),
            expiry: Some("2DTE".to_owned()),
            steps: Some("25".to_owned()),
            compare: Some("0v2".to_owned()),
        };
        let params = query.validate().unwrap();
        assert_eq!(params.date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(params.time.as_deref(), Some("14:05"));
        assert_eq!(params.dte, Dte::Two);
        assert_eq!(params.steps, 25);
        assert_eq!(params.compare, Compare::ZeroVsTwo);
    }

    #[test]
    fn preview_limit_is_capped() {
        let query = PreviewQuery { dataset: Some("options".to_owned()), offset: 0, limit: 1_000_000 };
        assert_eq!(query.capped_limit(), MAX_QUERY_LIMIT);
        assert_eq!(query.dataset().unwrap(), DatasetKind::Options);
    }

    #[test]
    fn rows_query_requires_date() {
        assert!(RowsQuery::default().date_range().is_err());
        assert!(RowsQuery::default().option_filter().is_err());
    }

    #[test]
    fn rows_query_builds_option_filter() {
        let query = RowsQuery {
            date: Some("2024-03-01".to_owned()),
            start: Some("14:00".to_owned()),
            expiry: Some("2024-03-04".to_owned()),
            min_strike: Some("410".to_owned()),
            ..RowsQuery::default()
        };
        let (date, filter) = query.option_filter().unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        let window = filter.window.unwrap();
        assert!(window.contains(NaiveTime::from_hms_opt(14, 0, 0).unwrap()));
        assert!(!window.contains(NaiveTime::from_hms_opt(13, 59, 0).unwrap()));
        assert_eq!(filter.expiry, NaiveDate::from_ymd_opt(2024, 3, 4));
        assert_eq!(filter.min_strike, Some(410.0));
        assert_eq!(filter.max_strike, None);
    }

    #[test]
    fn rows_query_rejects_bad_values() {
        let base = || RowsQuery { date: Some("2024-03-01".to_owned()), ..RowsQuery::default() };
        let bad_strike = RowsQuery { min_strike: Some("NaN".to_owned()), ..base() };
        assert!(bad_strike.option_filter().is_err());
        let bad_time = RowsQuery { start: Some("25:99".to_owned()), ..base() };
        assert!(bad_time.option_filter().is_err());
        let inverted = RowsQuery { start: Some("15:00".to_owned()), end: Some("14:00".to_owned()), ..base() };
        assert!(inverted.option_filter().is_err());
        let backwards = RowsQuery { end_date: Some("2024-02-01".to_owned()), ..base() };
        assert!(backwards.date_range().is_err());
    }
}
