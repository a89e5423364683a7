#![allow(dead_code)]

use chrono::NaiveDate;
use folioscope::domain::error::FolioError;
use folioscope::domain::portfolio::{Portfolio, Position};
use folioscope::domain::series::{PriceSeries, RateSeries, TimeSeries};
use folioscope::ports::time_series_port::TimeSeriesPort;
use std::collections::HashMap;

pub const RISK_FREE: &str = "RF";

/// In-memory store. Series are returned clipped to the requested window.
pub struct MockTimeSeriesPort {
    pub prices: HashMap<String, PriceSeries>,
    pub risk_free: RateSeries,
    pub errors: HashMap<String, String>,
}

impl MockTimeSeriesPort {
    pub fn new() -> Self {
        Self {
            prices: HashMap::new(),
            risk_free: TimeSeries::new(RISK_FREE, vec![]).unwrap(),
            errors: HashMap::new(),
        }
    }

    pub fn with_prices(mut self, ticker: &str, pairs: &[(&str, f64)]) -> Self {
        self.prices.insert(ticker.to_string(), series(ticker, pairs));
        self
    }

    pub fn with_risk_free(mut self, pairs: &[(&str, f64)]) -> Self {
        self.risk_free = series(RISK_FREE, pairs);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl TimeSeriesPort for MockTimeSeriesPort {
    fn fetch_prices(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, FolioError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(FolioError::Database {
                reason: reason.clone(),
            });
        }
        Ok(match self.prices.get(ticker) {
            Some(s) => s.within(start_date, end_date),
            None => TimeSeries::new(ticker, vec![]).unwrap(),
        })
    }

    fn fetch_risk_free(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<RateSeries, FolioError> {
        Ok(self.risk_free.within(start_date, end_date))
    }

    fn list_tickers(&self) -> Result<Vec<String>, FolioError> {
        let mut tickers: Vec<String> = self.prices.keys().cloned().collect();
        tickers.sort();
        Ok(tickers)
    }

    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, FolioError> {
        Ok(self.prices.get(ticker).and_then(|s| {
            Some((s.first_date()?, s.last_date()?, s.len()))
        }))
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn series(name: &str, pairs: &[(&str, f64)]) -> TimeSeries {
    let pairs: Vec<(NaiveDate, f64)> = pairs.iter().map(|(d, v)| (date(d), *v)).collect();
    TimeSeries::from_pairs(name, &pairs).unwrap()
}

pub fn portfolio(name: &str, weights: &[(&str, f64)]) -> Portfolio {
    let positions = weights
        .iter()
        .map(|(t, w)| Position::new(*t, *w))
        .collect();
    Portfolio::from_positions(name, positions).unwrap()
}

pub const DATES: [&str; 4] = ["2024-01-02", "2024-01-03", "2024-01-04", "2024-01-05"];

fn on_dates(values: [f64; 4]) -> Vec<(&'static str, f64)> {
    DATES.iter().copied().zip(values).collect()
}

/// Two holdings, a benchmark and a flat 0.01% rate over four days.
pub fn scenario_store() -> MockTimeSeriesPort {
    MockTimeSeriesPort::new()
        .with_prices("A", &on_dates([100.0, 102.0, 101.0, 105.0]))
        .with_prices("B", &on_dates([50.0, 49.0, 50.0, 52.0]))
        .with_prices("SPY", &on_dates([200.0, 202.0, 203.0, 206.0]))
        .with_risk_free(&on_dates([0.0001; 4]))
}
