//! CSV file time-series adapter.
//!
//! Prices live in `<dir>/<TICKER>.csv` with `Date` and `Close` columns. The
//! risk-free history is a single file with `Date` and `Rate (%)` (or `Rate`)
//! columns holding percentages.

use crate::domain::error::FolioError;
use crate::domain::series::{Observation, PriceSeries, RateSeries, TimeSeries};
use crate::ports::time_series_port::TimeSeriesPort;
use chrono::NaiveDate;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const RISK_FREE_SERIES: &str = "RISK_FREE";

pub struct CsvAdapter {
    base_path: PathBuf,
    risk_free_path: PathBuf,
}

fn db_error(reason: String) -> FolioError {
    FolioError::Database { reason }
}

/// ISO first, then the `MM/DD/YYYY` form rate files are often published in.
pub fn parse_flexible_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%m/%d/%Y"))
        .ok()
}

fn column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
}

/// Sorts by date. A date listed twice is ambiguous and rejects the file.
fn into_series(name: &str, mut rows: Vec<Observation>) -> Result<TimeSeries, FolioError> {
    rows.sort_by_key(|o| o.date);
    TimeSeries::new(name, rows)
}

fn read_file(path: &Path) -> Result<Option<String>, FolioError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(db_error(format!("failed to read {}: {}", path.display(), e))),
    }
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf, risk_free_path: PathBuf) -> Self {
        Self {
            base_path,
            risk_free_path,
        }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker))
    }

    fn load_prices(&self, ticker: &str) -> Result<Vec<Observation>, FolioError> {
        let path = self.csv_path(ticker);
        let Some(content) = read_file(&path)? else {
            debug!(ticker, path = %path.display(), "no price file");
            return Ok(Vec::new());
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| db_error(format!("CSV parse error in {}: {}", path.display(), e)))?
            .clone();
        let date_col = column(&headers, &["date"])
            .ok_or_else(|| db_error(format!("{}: missing Date column", path.display())))?;
        let close_col = column(&headers, &["close", "adj close", "adj_close"])
            .ok_or_else(|| db_error(format!("{}: missing Close column", path.display())))?;

        let mut rows = Vec::new();
        for (i, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| db_error(format!("CSV parse error: {}", e)))?;
            let line = i + 2;

            let date_str = record.get(date_col).unwrap_or_default();
            let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|e| {
                db_error(format!(
                    "{} line {}: invalid date '{}': {}",
                    path.display(),
                    line,
                    date_str,
                    e
                ))
            })?;

            let close: f64 = record
                .get(close_col)
                .unwrap_or_default()
                .trim()
                .parse()
                .map_err(|e| {
                    db_error(format!(
                        "{} line {}: invalid close value: {}",
                        path.display(),
                        line,
                        e
                    ))
                })?;

            rows.push(Observation::new(date, close));
        }
        Ok(rows)
    }

    fn load_rates(&self) -> Result<Vec<Observation>, FolioError> {
        let path = &self.risk_free_path;
        let content = read_file(path)?
            .ok_or_else(|| db_error(format!("risk-free file {} not found", path.display())))?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| db_error(format!("CSV parse error in {}: {}", path.display(), e)))?
            .clone();
        let date_col = column(&headers, &["date", "effective date"])
            .ok_or_else(|| db_error(format!("{}: missing Date column", path.display())))?;
        let rate_col = column(&headers, &["rate (%)", "rate"])
            .ok_or_else(|| db_error(format!("{}: missing Rate column", path.display())))?;

        let mut rows = Vec::new();
        let mut skipped = 0usize;
        for result in rdr.records() {
            let Ok(record) = result else {
                skipped += 1;
                continue;
            };
            let date = record.get(date_col).and_then(parse_flexible_date);
            let rate = record
                .get(rate_col)
                .map(|v| v.trim().trim_end_matches('%').trim())
                .and_then(|v| v.parse::<f64>().ok());
            match (date, rate) {
                (Some(date), Some(rate)) => rows.push(Observation::new(date, rate / 100.0)),
                _ => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!(skipped, path = %path.display(), "skipped unparseable risk-free rows");
        }
        Ok(rows)
    }
}

impl TimeSeriesPort for CsvAdapter {
    fn fetch_prices(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, FolioError> {
        Ok(into_series(ticker, self.load_prices(ticker)?)?.within(start_date, end_date))
    }

    fn fetch_risk_free(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<RateSeries, FolioError> {
        Ok(into_series(RISK_FREE_SERIES, self.load_rates()?)?.within(start_date, end_date))
    }

    fn list_tickers(&self) -> Result<Vec<String>, FolioError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| {
            db_error(format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        let mut tickers = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| db_error(format!("directory entry error: {}", e)))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            if path == self.risk_free_path {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                tickers.push(stem.to_string());
            }
        }

        tickers.sort();
        Ok(tickers)
    }

    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, FolioError> {
        let series = into_series(ticker, self.load_prices(ticker)?)?;
        Ok(match (series.first_date(), series.last_date()) {
            (Some(first), Some(last)) => Some((first, last, series.len())),
            _ => None,
        })
    }
}
