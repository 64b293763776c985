//! Read side: filtered rows, the selected minute of a day, the option chain
//! around the ATM strike and straddle series.

mod atm;
mod chain;
mod straddle;

pub use atm::{atm_strike, round_to_increment};
pub use chain::{ChainRow, build_chain};
pub use straddle::{Compare, StraddlePoint, StraddleSeries, build_series, straddle_at};

use chrono::{NaiveDate, NaiveDateTime};
use optchain_core::{
    DateRange, Dte, IndexRow, MAX_STRIKE_STEPS, OptionRow, TimeWindow, parse_time_of_day,
};
use optchain_storage::SharedStore;
use optchain_storage::traits::{IndexStore, OptionStore, StatsStore};
use serde::Serialize;

use crate::error::ServiceError;

/// Optional narrowing of an option query.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OptionFilter {
    pub window: Option<TimeWindow>,
    pub expiry: Option<NaiveDate>,
    pub min_strike: Option<f64>,
    pub max_strike: Option<f64>,
}

/// Index minutes of one trade date and the minute currently selected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayView {
    pub date: NaiveDate,
    /// Every index minute of the day, ascending.
    pub minutes: Vec<NaiveDateTime>,
    /// Index bars inside the regular session, ascending.
    pub session: Vec<IndexRow>,
    pub selected: Option<NaiveDateTime>,
    /// Index open at `selected`.
    pub open_price: Option<f64>,
    /// Position of `selected` in `session`, for the time slider.
    pub slider_index: usize,
}

impl DayView {
    pub fn is_empty(&self) -> bool {
        self.minutes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainView {
    pub date: NaiveDate,
    pub selected: Option<NaiveDateTime>,
    pub dte: Dte,
    pub expiry: NaiveDate,
    pub open_price: Option<f64>,
    pub atm_strike: Option<f64>,
    /// Whether `atm_strike` is a listed strike rather than the rounded price.
    pub atm_listed: bool,
    pub steps: u32,
    /// Quotes found for the selected minute and expiry.
    pub quotes_found: usize,
    pub rows: Vec<ChainRow>,
}

/// Series behind the price and straddle charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub date: NaiveDate,
    pub session: Vec<IndexRow>,
    /// One series per DTE, in `Dte::ALL` order.
    pub straddles: Vec<StraddleSeries>,
}

impl ChartData {
    pub fn series(&self, dte: Dte) -> Option<&StraddleSeries> {
        self.straddles.iter().find(|s| s.dte == dte)
    }
}

pub struct QueryService {
    storage: SharedStore,
    strike_increment: f64,
}

impl QueryService {
    #[must_use]
    pub const fn new(storage: SharedStore, strike_increment: f64) -> Self {
        Self { storage, strike_increment }
    }

    /// Trade dates with index data, newest first.
    pub async fn available_dates(&self) -> Result<Vec<NaiveDate>, ServiceError> {
        Ok(self.storage.available_dates().await?)
    }

    pub async fn index_rows(&self, range: DateRange) -> Result<Vec<IndexRow>, ServiceError> {
        Ok(self.storage.query_index(range).await?)
    }

    /// Quotes of one trade date ordered by time, strike, type.
    pub async fn option_rows(
        &self,
        date: NaiveDate,
        filter: OptionFilter,
    ) -> Result<Vec<OptionRow>, ServiceError> {
        if let (Some(lo), Some(hi)) = (filter.min_strike, filter.max_strike) {
            if lo > hi {
                return Err(ServiceError::InvalidInput(format!(
                    "min_strike {lo} is greater than max_strike {hi}"
                )));
            }
        }
        let mut rows = self.storage.query_options(date, filter.window, filter.expiry).await?;
        rows.retain(|r| {
            filter.min_strike.is_none_or(|lo| r.strike >= lo)
                && filter.max_strike.is_none_or(|hi| r.strike <= hi)
        });
        Ok(rows)
    }

    /// Load a trade date and resolve the selected minute.
    ///
    /// The requested `HH:MM` is used when it is a session minute. Without a
    /// request the first minute of the day is taken. Anything outside the
    /// session falls back to the last session minute.
    pub async fn day_view(
        &self,
        date: NaiveDate,
        requested_time: Option<&str>,
    ) -> Result<DayView, ServiceError> {
        let rows = self.storage.query_index(DateRange::single(date)).await?;
        let window = TimeWindow::regular_session();

        let mut selected = match requested_time.map(str::trim).filter(|t| !t.is_empty()) {
            Some(raw) => parse_time_of_day(raw).map(|t| date.and_time(t)),
            None => rows.first().map(|r| r.ts),
        };

        let session: Vec<IndexRow> =
            rows.iter().filter(|r| window.contains(r.ts.time())).cloned().collect();
        let mut slider_index = 0;
        if let Some(last) = session.last() {
            match selected.and_then(|ts| session.iter().position(|r| r.ts == ts)) {
                Some(pos) => slider_index = pos,
                None => {
                    selected = Some(last.ts);
                    slider_index = session.len() - 1;
                },
            }
        }

        let open_price = selected.and_then(|ts| rows.iter().find(|r| r.ts == ts)).map(|r| r.open);
        Ok(DayView {
            date,
            minutes: rows.iter().map(|r| r.ts).collect(),
            session,
            selected,
            open_price,
            slider_index,
        })
    }

    /// Chain for the selected minute of `day`.
    pub async fn chain_for(
        &self,
        day: &DayView,
        dte: Dte,
        steps: u32,
    ) -> Result<ChainView, ServiceError> {
        let steps = steps.min(MAX_STRIKE_STEPS);
        let expiry = dte.expiry_for(day.date);
        let mut view = ChainView {
            date: day.date,
            selected: day.selected,
            dte,
            expiry,
            open_price: day.open_price,
            atm_strike: None,
            atm_listed: false,
            steps,
            quotes_found: 0,
            rows: Vec::new(),
        };
        let (Some(ts), Some(price)) = (day.selected, day.open_price) else {
            return Ok(view);
        };

        let quotes = self.storage.options_at(ts, expiry).await?;
        let listed = atm_strike(quotes.iter().map(|q| q.strike), price);
        let atm = listed.unwrap_or_else(|| round_to_increment(price, self.strike_increment));

        view.atm_strike = Some(atm);
        view.atm_listed = listed.is_some();
        view.quotes_found = quotes.len();
        view.rows = build_chain(&quotes, atm, self.strike_increment, steps);
        Ok(view)
    }

    pub async fn chain(
        &self,
        date: NaiveDate,
        requested_time: Option<&str>,
        dte: Dte,
        steps: u32,
    ) -> Result<ChainView, ServiceError> {
        let day = self.day_view(date, requested_time).await?;
        self.chain_for(&day, dte, steps).await
    }

    /// Session prices and the ATM straddle series of every DTE.
    pub async fn charts_for(&self, day: &DayView) -> Result<ChartData, ServiceError> {
        let quotes = if day.session.is_empty() {
            Vec::new()
        } else {
            self.storage
                .query_options(day.date, Some(TimeWindow::regular_session()), None)
                .await?
        };
        let straddles = Dte::ALL
            .iter()
            .map(|&dte| build_series(day.date, &day.session, &quotes, dte))
            .collect();
        Ok(ChartData { date: day.date, session: day.session.clone(), straddles })
    }

    pub async fn charts(&self, date: NaiveDate) -> Result<ChartData, ServiceError> {
        let day = self.day_view(date, None).await?;
        self.charts_for(&day).await
    }
}
