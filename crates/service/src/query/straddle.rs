//! ATM straddle series over the session and the DTE comparison selector.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use optchain_core::{Dte, IndexRow, OptionRow, OptionType, strike_ticks};
use serde::{Deserialize, Serialize};

use super::atm::atm_strike;
use crate::error::ServiceError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StraddlePoint {
    pub ts: NaiveDateTime,
    pub underlying: f64,
    /// ATM strike at this minute; `None` when no strikes are listed.
    pub strike: Option<f64>,
    /// Call mid + put mid at `strike`; `None` when either leg is missing.
    pub price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StraddleSeries {
    pub dte: Dte,
    pub expiry: NaiveDate,
    pub points: Vec<StraddlePoint>,
}

/// Straddle at the ATM strike of one minute's quotes for one expiry.
pub fn straddle_at(quotes: &[&OptionRow], underlying: f64) -> (Option<f64>, Option<f64>) {
    let Some(strike) = atm_strike(quotes.iter().map(|q| q.strike), underlying) else {
        return (None, None);
    };
    let ticks = strike_ticks(strike);
    let leg = |kind: OptionType| {
        quotes.iter().find(|q| q.option_type == kind && strike_ticks(q.strike) == ticks).map(|q| q.mid())
    };
    let price = leg(OptionType::Call).zip(leg(OptionType::Put)).map(|(call, put)| call + put);
    (Some(strike), price)
}

/// One point per session minute, aligned with `session`.
pub fn build_series(
    trade_date: NaiveDate,
    session: &[IndexRow],
    quotes: &[OptionRow],
    dte: Dte,
) -> StraddleSeries {
    let expiry = dte.expiry_for(trade_date);
    let mut by_minute: HashMap<NaiveDateTime, Vec<&OptionRow>> = HashMap::new();
    for quote in quotes.iter().filter(|q| q.expiry == expiry) {
        by_minute.entry(quote.ts).or_default().push(quote);
    }

    let points = session
        .iter()
        .map(|bar| {
            let (strike, price) = by_minute
                .get(&bar.ts)
                .map_or((None, None), |minute| straddle_at(minute, bar.open));
            StraddlePoint { ts: bar.ts, underlying: bar.open, strike, price }
        })
        .collect();

    StraddleSeries { dte, expiry, points }
}

/// Which DTE straddle series the comparison chart shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Compare {
    #[default]
    #[serde(rename = "all")]
    All,
    #[serde(rename = "0v1")]
    ZeroVsOne,
    #[serde(rename = "0v2")]
    ZeroVsTwo,
    #[serde(rename = "1v2")]
    OneVsTwo,
}

impl Compare {
    pub const ALL: [Self; 4] = [Self::All, Self::ZeroVsOne, Self::ZeroVsTwo, Self::OneVsTwo];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::ZeroVsOne => "0v1",
            Self::ZeroVsTwo => "0v2",
            Self::OneVsTwo => "1v2",
        }
    }

    pub fn dtes(&self) -> &'static [Dte] {
        match self {
            Self::All => &[Dte::Zero, Dte::One, Dte::Two],
            Self::ZeroVsOne => &[Dte::Zero, Dte::One],
            Self::ZeroVsTwo => &[Dte::Zero, Dte::Two],
            Self::OneVsTwo => &[Dte::One, Dte::Two],
        }
    }

    /// e.g. "0DTE vs 2DTE"
    pub fn title(&self) -> String {
        self.dtes().iter().map(|d| d.label()).collect::<Vec<_>>().join(" vs ")
    }
}

impl std::str::FromStr for Compare {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|c| c.as_str() == wanted).ok_or_else(|| {
            ServiceError::InvalidInput(format!(
                "unknown comparison {s:?}, expected one of all, 0v1, 0v2, 1v2"
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(hm: (u32, u32)) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(hm.0, hm.1, 0).unwrap()
    }

    fn quote(ts: NaiveDateTime, expiry: NaiveDate, strike: f64, kind: OptionType, bid: f64, ask: f64) -> OptionRow {
        OptionRow::new(ts, expiry, strike, kind, bid, ask)
    }

    #[test]
    fn straddle_is_sum_of_mids_at_atm() {
        let t = at((14, 0));
        let exp = t.date();
        let quotes = [
            quote(t, exp, 420.0, OptionType::Call, 3.1, 3.3),
            quote(t, exp, 420.0, OptionType::Put, 2.9, 3.1),
            quote(t, exp, 425.0, OptionType::Call, 0.5, 0.7),
            quote(t, exp, 425.0, OptionType::Put, 5.0, 5.2),
        ];
        let refs: Vec<&OptionRow> = quotes.iter().collect();
        let (strike, price) = straddle_at(&refs, 420.5);
        assert_eq!(strike, Some(420.0));
        assert!((price.unwrap() - 6.2).abs() < 1e-9);
    }

    #[test]
    fn missing_leg_leaves_a_gap_but_keeps_strike() {
        let t = at((14, 0));
        let quotes = [quote(t, t.date(), 420.0, OptionType::Call, 3.1, 3.3)];
        let refs: Vec<&OptionRow> = quotes.iter().collect();
        assert_eq!(straddle_at(&refs, 420.0), (Some(420.0), None));
    }

    #[test]
    fn series_aligns_with_session_and_filters_expiry() {
        let date = at((0, 0)).date();
        let session = vec![IndexRow::new(at((13, 30)), 420.2), IndexRow::new(at((13, 31)), 421.0)];
        let next_day = Dte::One.expiry_for(date);
        let quotes = vec![
            quote(at((13, 30)), next_day, 420.0, OptionType::Call, 4.0, 4.2),
            quote(at((13, 30)), next_day, 420.0, OptionType::Put, 3.8, 4.0),
            quote(at((13, 30)), date, 420.0, OptionType::Call, 1.0, 1.2),
        ];

        let one = build_series(date, &session, &quotes, Dte::One);
        assert_eq!(one.points.len(), 2);
        assert!((one.points[0].price.unwrap() - 8.0).abs() < 1e-9);
        assert_eq!(one.points[1].price, None);
        assert_eq!(one.points[1].strike, None);

        let zero = build_series(date, &session, &quotes, Dte::Zero);
        assert_eq!(zero.points[0].strike, Some(420.0));
        assert_eq!(zero.points[0].price, None);
    }

    #[test]
    fn compare_selects_series() {
        assert_eq!("0v2".parse::<Compare>().unwrap().dtes(), &[Dte::Zero, Dte::Two]);
        assert_eq!(Compare::All.title(), "0DTE vs 1DTE vs 2DTE");
        assert_eq!(Compare::OneVsTwo.title(), "1DTE vs 2DTE");
        assert!("3v4".parse::<Compare>().is_err());
    }
}
