//! Strike grid around the ATM strike with call/put quotes per row.

use std::collections::HashMap;

use optchain_core::{OptionRow, OptionType, strike_from_ticks, strike_ticks};
use serde::Serialize;

/// One strike of the chain table. Quotes are the opening bid/ask.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainRow {
    pub strike: f64,
    pub call_bid: Option<f64>,
    pub call_ask: Option<f64>,
    pub put_bid: Option<f64>,
    pub put_ask: Option<f64>,
    pub is_atm: bool,
}

/// Rows for `atm ± steps × increment`, ascending. Strikes without a quote
/// keep `None` on that side.
pub fn build_chain(quotes: &[OptionRow], atm: f64, increment: f64, steps: u32) -> Vec<ChainRow> {
    let step = strike_ticks(increment).max(1);
    let centre = strike_ticks(atm);
    let by_strike: HashMap<(i64, OptionType), &OptionRow> =
        quotes.iter().map(|q| ((strike_ticks(q.strike), q.option_type), q)).collect();
    let steps = i64::from(steps);

    (-steps..=steps)
        .map(|k| {
            let ticks = centre.saturating_add(k.saturating_mul(step));
            let call = by_strike.get(&(ticks, OptionType::Call));
            let put = by_strike.get(&(ticks, OptionType::Put));
            ChainRow {
                strike: strike_from_ticks(ticks),
                call_bid: call.map(|q| q.bid_open),
                call_ask: call.map(|q| q.ask_open),
                put_bid: put.map(|q| q.bid_open),
                put_ask: put.map(|q| q.ask_open),
                is_atm: k == 0,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn quote(strike: f64, kind: OptionType, bid: f64) -> OptionRow {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(14, 0, 0).unwrap();
        OptionRow::new(ts, ts.date(), strike, kind, bid, bid + 0.1)
    }

    #[test]
    fn grid_spans_steps_on_both_sides() {
        let rows = build_chain(&[], 420.0, 1.0, 3);
        let strikes: Vec<f64> = rows.iter().map(|r| r.strike).collect();
        assert_eq!(strikes, vec![417.0, 418.0, 419.0, 420.0, 421.0, 422.0, 423.0]);
        assert!(rows[3].is_atm);
        assert_eq!(rows.iter().filter(|r| r.is_atm).count(), 1);
    }

    #[test]
    fn quotes_land_on_their_strike_and_side() {
        let quotes = [
            quote(420.0, OptionType::Call, 1.5),
            quote(420.0, OptionType::Put, 1.2),
            quote(421.0, OptionType::Call, 1.0),
            quote(450.0, OptionType::Call, 0.1),
        ];
        let rows = build_chain(&quotes, 420.0, 1.0, 1);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].call_bid, None);
        assert_eq!(rows[1].call_bid, Some(1.5));
        assert_eq!(rows[1].put_ask, Some(1.3));
        assert_eq!(rows[2].call_bid, Some(1.0));
        assert_eq!(rows[2].put_bid, None);
    }

    #[test]
    fn grid_near_the_tick_limit_does_not_overflow() {
        let rows = build_chain(&[], 1.0e15, 1.0e12, 2);
        assert_eq!(rows.len(), 5);
        assert!(rows.iter().all(|r| r.strike.is_finite()));
        assert!(rows[2].is_atm);
    }

    #[test]
    fn fractional_increments_do_not_drift() {
        let rows = build_chain(&[], 100.0, 0.1, 10);
        assert_eq!(rows.first().map(|r| r.strike), Some(99.0));
        assert_eq!(rows.last().map(|r| r.strike), Some(101.0));
    }
}
