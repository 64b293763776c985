//! Column layouts of the two CSV datasets and per-cell validation.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use csv::StringRecord;
use optchain_core::{
    CoreError, IndexRow, MAX_PRICE, OptionKey, OptionRow, OptionType, normalize_strike, parse_date,
    parse_minute,
};

/// Header positions keyed by lowercased column name.
#[derive(Debug)]
pub(crate) struct ColumnMap(HashMap<String, usize>);

impl ColumnMap {
    pub(crate) fn new(headers: &StringRecord) -> Self {
        let map = headers
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim_start_matches('\u{feff}').trim().to_ascii_lowercase(), i))
            .collect();
        Self(map)
    }

    pub(crate) fn get(&self, name: &str) -> Option<usize> {
        self.0.get(&name.to_ascii_lowercase()).copied()
    }

    pub(crate) fn missing(&self, required: &[&str]) -> Vec<String> {
        required.iter().filter(|c| self.get(c).is_none()).map(|c| (*c).to_owned()).collect()
    }
}

/// A dataset layout: which columns it needs and how a record becomes a row.
pub(crate) trait RowSchema: Sized {
    type Row: Clone;
    type Key: Ord;

    const REQUIRED: &'static [&'static str];

    /// Resolve column positions. Only called once `REQUIRED` is satisfied.
    fn bind(columns: &ColumnMap) -> Option<Self>;

    fn parse(&self, record: &StringRecord) -> Result<Self::Row, CoreError>;

    fn key(row: &Self::Row) -> Self::Key;
}

fn cell(record: &StringRecord, idx: Option<usize>) -> &str {
    idx.and_then(|i| record.get(i)).map_or("", str::trim)
}

fn required<'r>(record: &'r StringRecord, idx: usize, field: &'static str) -> Result<&'r str, CoreError> {
    let raw = cell(record, Some(idx));
    if raw.is_empty() {
        return Err(CoreError::invalid(field, raw, "value is required"));
    }
    Ok(raw)
}

fn is_null(raw: &str) -> bool {
    raw.is_empty() || ["nan", "null", "none"].iter().any(|n| raw.eq_ignore_ascii_case(n))
}

fn number(field: &'static str, raw: &str) -> Result<f64, CoreError> {
    let value: f64 =
        raw.parse().map_err(|_| CoreError::invalid(field, raw, "not a number"))?;
    if !value.is_finite() {
        return Err(CoreError::invalid(field, raw, "not a finite number"));
    }
    Ok(value)
}

fn bounded(field: &'static str, raw: &str, value: f64) -> Result<f64, CoreError> {
    if value > MAX_PRICE {
        return Err(CoreError::invalid(field, raw, format!("must not exceed {MAX_PRICE}")));
    }
    Ok(value)
}

fn positive(field: &'static str, raw: &str) -> Result<f64, CoreError> {
    let value = number(field, raw)?;
    if value <= 0.0 {
        return Err(CoreError::invalid(field, raw, "must be greater than zero"));
    }
    bounded(field, raw, value)
}

fn price(field: &'static str, raw: &str) -> Result<f64, CoreError> {
    let value = number(field, raw)?;
    if value < 0.0 {
        return Err(CoreError::invalid(field, raw, "must not be negative"));
    }
    bounded(field, raw, value)
}

fn optional_price(record: &StringRecord, idx: Option<usize>, field: &'static str) -> Result<Option<f64>, CoreError> {
    let raw = cell(record, idx);
    if is_null(raw) { Ok(None) } else { price(field, raw).map(Some) }
}

fn optional_number(record: &StringRecord, idx: Option<usize>, field: &'static str) -> Result<Option<f64>, CoreError> {
    let raw = cell(record, idx);
    if is_null(raw) { Ok(None) } else { number(field, raw).map(Some) }
}

/// Counts accept integral floats ("1200.0") as written by spreadsheet exports.
fn optional_count(record: &StringRecord, idx: Option<usize>, field: &'static str) -> Result<Option<i64>, CoreError> {
    let raw = cell(record, idx);
    if is_null(raw) {
        return Ok(None);
    }
    let value = match raw.parse::<i64>() {
        Ok(v) => v,
        Err(_) => {
            let f = number(field, raw)?;
            if f.fract() != 0.0 || f.abs() > 9.0e15 {
                return Err(CoreError::invalid(field, raw, "not a whole number"));
            }
            #[allow(clippy::cast_possible_truncation, reason = "checked integral and in range")]
            let whole = f as i64;
            whole
        },
    };
    if value < 0 {
        return Err(CoreError::invalid(field, raw, "must not be negative"));
    }
    Ok(Some(value))
}

/// `datetime_UTC, open[, high, low, close, volume]`
#[derive(Debug)]
pub(crate) struct IndexSchema {
    ts: usize,
    open: usize,
    high: Option<usize>,
    low: Option<usize>,
    close: Option<usize>,
    volume: Option<usize>,
}

impl RowSchema for IndexSchema {
    type Row = IndexRow;
    type Key = NaiveDateTime;

    const REQUIRED: &'static [&'static str] = &["datetime_UTC", "open"];

    fn bind(columns: &ColumnMap) -> Option<Self> {
        Some(Self {
            ts: columns.get("datetime_UTC")?,
            open: columns.get("open")?,
            high: columns.get("high"),
            low: columns.get("low"),
            close: columns.get("close"),
            volume: columns.get("volume"),
        })
    }

    fn parse(&self, record: &StringRecord) -> Result<IndexRow, CoreError> {
        Ok(IndexRow {
            ts: parse_minute("datetime_UTC", required(record, self.ts, "datetime_UTC")?)?,
            open: positive("open", required(record, self.open, "open")?)?,
            high: optional_price(record, self.high, "high")?,
            low: optional_price(record, self.low, "low")?,
            close: optional_price(record, self.close, "close")?,
            volume: optional_count(record, self.volume, "volume")?,
        })
    }

    fn key(row: &IndexRow) -> NaiveDateTime {
        row.ts
    }
}

/// `UTC_MINUTE, EXPIRY_DATE, STRIKE, OPTION_TYPE, bid_open, ask_open` plus
/// optional close quotes, volume, open interest and greeks.
#[derive(Debug)]
pub(crate) struct OptionSchema {
    ts: usize,
    expiry: usize,
    strike: usize,
    option_type: usize,
    bid_open: usize,
    ask_open: usize,
    bid_close: Option<usize>,
    ask_close: Option<usize>,
    volume: Option<usize>,
    open_interest: Option<usize>,
    iv: Option<usize>,
    delta: Option<usize>,
    gamma: Option<usize>,
    theta: Option<usize>,
    vega: Option<usize>,
}

impl RowSchema for OptionSchema {
    type Row = OptionRow;
    type Key = OptionKey;

    const REQUIRED: &'static [&'static str] =
        &["UTC_MINUTE", "EXPIRY_DATE", "STRIKE", "OPTION_TYPE", "bid_open", "ask_open"];

    fn bind(columns: &ColumnMap) -> Option<Self> {
        Some(Self {
            ts: columns.get("UTC_MINUTE")?,
            expiry: columns.get("EXPIRY_DATE")?,
            strike: columns.get("STRIKE")?,
            option_type: columns.get("OPTION_TYPE")?,
            bid_open: columns.get("bid_open")?,
            ask_open: columns.get("ask_open")?,
            bid_close: columns.get("bid_close"),
            ask_close: columns.get("ask_close"),
            volume: columns.get("volume"),
            open_interest: columns.get("open_interest"),
            iv: columns.get("iv"),
            delta: columns.get("delta"),
            gamma: columns.get("gamma"),
            theta: columns.get("theta"),
            vega: columns.get("vega"),
        })
    }

    fn parse(&self, record: &StringRecord) -> Result<OptionRow, CoreError> {
        let option_type: OptionType = required(record, self.option_type, "OPTION_TYPE")?.parse()?;
        Ok(OptionRow {
            ts: parse_minute("UTC_MINUTE", required(record, self.ts, "UTC_MINUTE")?)?,
            expiry: parse_date("EXPIRY_DATE", required(record, self.expiry, "EXPIRY_DATE")?)?,
            strike: normalize_strike(positive("STRIKE", required(record, self.strike, "STRIKE")?)?),
            option_type,
            bid_open: price("bid_open", required(record, self.bid_open, "bid_open")?)?,
            ask_open: price("ask_open", required(record, self.ask_open, "ask_open")?)?,
            bid_close: optional_price(record, self.bid_close, "bid_close")?,
            ask_close: optional_price(record, self.ask_close, "ask_close")?,
            volume: optional_count(record, self.volume, "volume")?,
            open_interest: optional_count(record, self.open_interest, "open_interest")?,
            iv: optional_number(record, self.iv, "iv")?,
            delta: optional_number(record, self.delta, "delta")?,
            gamma: optional_number(record, self.gamma, "gamma")?,
            theta: optional_number(record, self.theta, "theta")?,
            vega: optional_number(record, self.vega, "vega")?,
        })
    }

    fn key(row: &OptionRow) -> OptionKey {
        row.key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[&str]) -> StringRecord {
        StringRecord::from(fields.to_vec())
    }

    #[test]
    fn headers_match_case_insensitively_and_ignore_bom() {
        let columns = ColumnMap::new(&record(&["\u{feff}DATETIME_utc", " Open "]));
        assert_eq!(columns.get("datetime_UTC"), Some(0));
        assert_eq!(columns.get("open"), Some(1));
        assert!(columns.missing(IndexSchema::REQUIRED).is_empty());
        assert_eq!(columns.missing(&["close"]), vec!["close".to_owned()]);
    }

    #[test]
    fn index_row_reads_optional_columns() {
        let columns = ColumnMap::new(&record(&["datetime_UTC", "open", "volume", "close"]));
        let schema = IndexSchema::bind(&columns).unwrap();
        let row = schema.parse(&record(&["2024-03-01 14:00:37", "5100.25", "1200.0", ""])).unwrap();
        assert_eq!(row.ts.format("%H:%M:%S").to_string(), "14:00:00");
        assert_eq!(row.volume, Some(1200));
        assert_eq!(row.close, None);
    }

    #[test]
    fn index_open_must_be_positive() {
        let columns = ColumnMap::new(&record(&["datetime_UTC", "open"]));
        let schema = IndexSchema::bind(&columns).unwrap();
        assert!(schema.parse(&record(&["2024-03-01 14:00", "0"])).is_err());
        assert!(schema.parse(&record(&["2024-03-01 14:00", "abc"])).is_err());
        assert!(schema.parse(&record(&["2024-03-01 14:00", "inf"])).is_err());
        assert!(schema.parse(&record(&["", "5000"])).is_err());
    }

    #[test]
    fn prices_above_the_ceiling_are_rejected() {
        let columns = ColumnMap::new(&record(&["datetime_UTC", "open"]));
        let schema = IndexSchema::bind(&columns).unwrap();
        let err = schema.parse(&record(&["2024-03-01 14:00", "1000000000000000"])).unwrap_err();
        assert!(err.to_string().contains("must not exceed"));
        assert!(schema.parse(&record(&["2024-03-01 14:00", "9999999"])).is_ok());

        let columns = ColumnMap::new(&record(OptionSchema::REQUIRED));
        let schema = OptionSchema::bind(&columns).unwrap();
        assert!(schema.parse(&record(&["1709301600", "2024-03-01", "1e12", "C", "1", "2"])).is_err());
        assert!(schema.parse(&record(&["1709301600", "2024-03-01", "5100", "C", "1", "1e12"])).is_err());
    }

    #[test]
    fn strikes_are_snapped_to_the_tick_grid() {
        let columns = ColumnMap::new(&record(OptionSchema::REQUIRED));
        let schema = OptionSchema::bind(&columns).unwrap();
        let a = schema.parse(&record(&["1709301600", "2024-03-01", "420.00001", "C", "1", "2"])).unwrap();
        let b = schema.parse(&record(&["1709301600", "2024-03-01", "420.00004", "C", "1", "2"])).unwrap();
        assert_eq!(a.strike, 420.0);
        assert_eq!(a.strike, b.strike);
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn option_row_accepts_epoch_minutes_and_long_type_names() {
        let columns = ColumnMap::new(&record(&[
            "UTC_MINUTE", "EXPIRY_DATE", "STRIKE", "OPTION_TYPE", "bid_open", "ask_open", "theta",
        ]));
        let schema = OptionSchema::bind(&columns).unwrap();
        let row = schema
            .parse(&record(&["1709301600", "01-03-2024", "5100", "put", "2.10", "2.30", "-0.45"]))
            .unwrap();
        assert_eq!(row.ts.format("%Y-%m-%d %H:%M").to_string(), "2024-03-01 14:00");
        assert_eq!(row.expiry.format("%Y-%m-%d").to_string(), "2024-03-01");
        assert_eq!(row.option_type, OptionType::Put);
        assert_eq!(row.theta, Some(-0.45));
    }

    #[test]
    fn option_prices_must_not_be_negative() {
        let columns = ColumnMap::new(&record(OptionSchema::REQUIRED));
        let schema = OptionSchema::bind(&columns).unwrap();
        let err = schema
            .parse(&record(&["1709301600", "2024-03-01", "5100", "C", "-1", "2.30"]))
            .unwrap_err();
        assert!(err.to_string().contains("bid_open"));
        assert!(schema.parse(&record(&["1709301600", "2024-03-01", "5100", "X", "1", "2"])).is_err());
    }
}
