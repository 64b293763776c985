use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Which CSV layout an upload follows.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Index,
    Options,
}

impl DatasetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Options => "options",
        }
    }
}

impl std::str::FromStr for DatasetKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "index" => Ok(Self::Index),
            "options" | "option" => Ok(Self::Options),
            _ => Err(CoreError::invalid("dataset", s, "expected 'index' or 'options'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OptionType {
    #[serde(rename = "C")]
    Call,
    #[serde(rename = "P")]
    Put,
}

impl OptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "C",
            Self::Put => "P",
        }
    }
}

impl std::str::FromStr for OptionType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "C" | "CALL" => Ok(Self::Call),
            "P" | "PUT" => Ok(Self::Put),
            _ => Err(CoreError::invalid("OPTION_TYPE", s, "expected C or P")),
        }
    }
}

/// Days to expiry relative to the trade date.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Dte {
    #[default]
    #[serde(rename = "0DTE")]
    Zero,
    #[serde(rename = "1DTE")]
    One,
    #[serde(rename = "2DTE")]
    Two,
}

impl Dte {
    pub const ALL: [Self; 3] = [Self::Zero, Self::One, Self::Two];

    pub const fn days(self) -> u64 {
        match self {
            Self::Zero => 0,
            Self::One => 1,
            Self::Two => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Zero => "0DTE",
            Self::One => "1DTE",
            Self::Two => "2DTE",
        }
    }

    /// Calendar expiry for contracts of this DTE traded on `trade_date`.
    pub fn expiry_for(self, trade_date: NaiveDate) -> NaiveDate {
        trade_date.checked_add_days(Days::new(self.days())).unwrap_or(trade_date)
    }
}

impl std::str::FromStr for Dte {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().trim_end_matches("DTE") {
            "0" => Ok(Self::Zero),
            "1" => Ok(Self::One),
            "2" => Ok(Self::Two),
            _ => Err(CoreError::invalid("expiry", s, "expected 0DTE, 1DTE or 2DTE")),
        }
    }
}

/// One index minute bar. `open` is the index price used for ATM selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRow {
    pub ts: NaiveDateTime,
    pub open: f64,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<i64>,
}

impl IndexRow {
    pub fn new(ts: NaiveDateTime, open: f64) -> Self {
        Self { ts, open, high: None, low: None, close: None, volume: None }
    }

    pub fn trade_date(&self) -> NaiveDate {
        self.ts.date()
    }
}

/// Strike in ten-thousandths of a point, the precision at which strikes are compared.
pub fn strike_ticks(strike: f64) -> i64 {
    #[allow(clippy::cast_possible_truncation, reason = "strikes are far below i64 range")]
    let ticks = (strike * 10_000.0).round() as i64;
    ticks
}

/// Inverse of [`strike_ticks`].
#[allow(clippy::cast_precision_loss, reason = "tick counts stay well inside f64 mantissa")]
pub fn strike_from_ticks(ticks: i64) -> f64 {
    ticks as f64 / 10_000.0
}

/// `strike` rounded to the tick grid, so stores keyed on the raw value agree
/// with stores keyed on [`strike_ticks`].
pub fn normalize_strike(strike: f64) -> f64 {
    strike_from_ticks(strike_ticks(strike))
}

/// Uniqueness key of an option quote. Field order is the storage sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OptionKey {
    pub ts: NaiveDateTime,
    pub strike_ticks: i64,
    pub option_type: OptionType,
    pub expiry: NaiveDate,
}

/// One option quote for one minute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionRow {
    pub ts: NaiveDateTime,
    pub expiry: NaiveDate,
    pub strike: f64,
    pub option_type: OptionType,
    pub bid_open: f64,
    pub ask_open: f64,
    pub bid_close: Option<f64>,
    pub ask_close: Option<f64>,
    pub volume: Option<i64>,
    pub open_interest: Option<i64>,
    pub iv: Option<f64>,
    pub delta: Option<f64>,
    pub gamma: Option<f64>,
    pub theta: Option<f64>,
    pub vega: Option<f64>,
}

impl OptionRow {
    pub fn new(
        ts: NaiveDateTime,
        expiry: NaiveDate,
        strike: f64,
        option_type: OptionType,
        bid_open: f64,
        ask_open: f64,
    ) -> Self {
        Self {
            ts,
            expiry,
            strike,
            option_type,
            bid_open,
            ask_open,
            bid_close: None,
            ask_close: None,
            volume: None,
            open_interest: None,
            iv: None,
            delta: None,
            gamma: None,
            theta: None,
            vega: None,
        }
    }

    /// Mid of the opening bid/ask, the price used for straddles.
    pub fn mid(&self) -> f64 {
        (self.bid_open + self.ask_open) / 2.0
    }

    pub fn key(&self) -> OptionKey {
        OptionKey {
            ts: self.ts,
            strike_ticks: strike_ticks(self.strike),
            option_type: self.option_type,
            expiry: self.expiry,
        }
    }

    pub fn trade_date(&self) -> NaiveDate {
        self.ts.date()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_type_accepts_long_and_short_forms() {
        assert_eq!("c".parse::<OptionType>().unwrap(), OptionType::Call);
        assert_eq!("PUT".parse::<OptionType>().unwrap(), OptionType::Put);
        assert!("X".parse::<OptionType>().is_err());
    }

    #[test]
    fn dte_parses_labels_and_computes_expiry() {
        assert_eq!("1DTE".parse::<Dte>().unwrap(), Dte::One);
        assert_eq!("2dte".parse::<Dte>().unwrap(), Dte::Two);
        assert_eq!("0".parse::<Dte>().unwrap(), Dte::Zero);
        assert!("3DTE".parse::<Dte>().is_err());
        let d = NaiveDate::from_ymd_opt(2024, 2, 28).unwrap();
        assert_eq!(Dte::Two.expiry_for(d), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn dataset_kind_parses() {
        assert_eq!("Index".parse::<DatasetKind>().unwrap(), DatasetKind::Index);
        assert_eq!("option".parse::<DatasetKind>().unwrap(), DatasetKind::Options);
        assert!("futures".parse::<DatasetKind>().is_err());
    }

    #[test]
    fn option_keys_sort_by_time_then_strike_then_type() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap().and_hms_opt(14, 0, 0).unwrap();
        let exp = ts.date();
        let put_420 = OptionRow::new(ts, exp, 420.0, OptionType::Put, 1.0, 1.2).key();
        let call_420 = OptionRow::new(ts, exp, 420.0, OptionType::Call, 1.0, 1.2).key();
        let call_415 = OptionRow::new(ts, exp, 415.0, OptionType::Call, 1.0, 1.2).key();
        let mut keys = vec![put_420, call_420, call_415];
        keys.sort();
        assert_eq!(keys, vec![call_415, call_420, put_420]);
    }

    #[test]
    fn mid_is_average_of_open_quotes() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap().and_hms_opt(14, 0, 0).unwrap();
        let row = OptionRow::new(ts, ts.date(), 420.0, OptionType::Call, 1.10, 1.30);
        assert!((row.mid() - 1.20).abs() < 1e-12);
    }
}
