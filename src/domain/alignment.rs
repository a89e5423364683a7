//! Date alignment of the price, benchmark and risk-free series.
//!
//! The common timeline is the intersection of every series' dates inside the
//! analysis window. A date missing from any one series is dropped everywhere;
//! nothing is forward-filled or interpolated. Every series must span the
//! same first and last dates inside the window; one that starts late or
//! ends early fails the alignment rather than truncating the run.

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

use super::error::FolioError;
use super::series::{PriceSeries, RateSeries, TimeSeries};

pub const DEFAULT_BENCHMARK: &str = "SPY";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub benchmark: String,
}

impl AnalysisWindow {
    pub fn new(
        start: NaiveDate,
        end: NaiveDate,
        benchmark: impl Into<String>,
    ) -> Result<Self, FolioError> {
        if start > end {
            return Err(FolioError::InvalidWindow { start, end });
        }
        Ok(Self {
            start,
            end,
            benchmark: benchmark.into().trim().to_uppercase(),
        })
    }
}

/// Every input series re-indexed on the same dates.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedData {
    pub dates: Vec<NaiveDate>,
    pub prices: BTreeMap<String, PriceSeries>,
    pub benchmark: PriceSeries,
    pub risk_free: RateSeries,
}

fn clip(series: &TimeSeries, window: &AnalysisWindow) -> Result<TimeSeries, FolioError> {
    let clipped = series.within(window.start, window.end);
    if clipped.is_empty() {
        return Err(FolioError::Alignment {
            series: series.name().to_string(),
            start: window.start,
            end: window.end,
        });
    }
    Ok(clipped)
}

/// Every clipped series must open on the earliest first date and close on
/// the latest last date seen across all of them; the first one that does
/// not is reported.
fn check_coverage<'a>(series: impl Iterator<Item = &'a TimeSeries>) -> Result<(), FolioError> {
    let spans: Vec<(&str, NaiveDate, NaiveDate)> = series
        .filter_map(|s| Some((s.name(), s.first_date()?, s.last_date()?)))
        .collect();
    let (Some(first), Some(last)) = (
        spans.iter().map(|(_, f, _)| *f).min(),
        spans.iter().map(|(_, _, l)| *l).max(),
    ) else {
        return Ok(());
    };
    match spans.iter().find(|(_, f, l)| *f > first || *l < last) {
        Some((name, _, _)) => Err(FolioError::Alignment {
            series: name.to_string(),
            start: first,
            end: last,
        }),
        None => Ok(()),
    }
}

pub fn align(
    window: &AnalysisWindow,
    prices: &BTreeMap<String, PriceSeries>,
    benchmark: &PriceSeries,
    risk_free: &RateSeries,
) -> Result<AlignedData, FolioError> {
    let mut clipped_prices = BTreeMap::new();
    for (ticker, series) in prices {
        clipped_prices.insert(ticker.clone(), clip(series, window)?);
    }
    let benchmark = clip(benchmark, window)?;
    let risk_free = clip(risk_free, window)?;
    check_coverage(clipped_prices.values().chain([&benchmark, &risk_free]))?;

    let mut common: BTreeSet<NaiveDate> = benchmark.dates().collect();
    for series in clipped_prices.values().chain(std::iter::once(&risk_free)) {
        let dates: BTreeSet<NaiveDate> = series.dates().collect();
        common.retain(|d| dates.contains(d));
    }

    if common.is_empty() {
        return Err(FolioError::Alignment {
            series: "common timeline".to_string(),
            start: window.start,
            end: window.end,
        });
    }

    Ok(AlignedData {
        dates: common.iter().copied().collect(),
        prices: clipped_prices
            .into_iter()
            .map(|(ticker, series)| (ticker, series.restrict_to(&common)))
            .collect(),
        benchmark: benchmark.restrict_to(&common),
        risk_free: risk_free.restrict_to(&common),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn series(name: &str, days: &[u32]) -> TimeSeries {
        let pairs: Vec<_> = days.iter().map(|&day| (d(day), 100.0 + day as f64)).collect();
        TimeSeries::from_pairs(name, &pairs).unwrap()
    }

    fn window(start: u32, end: u32) -> AnalysisWindow {
        AnalysisWindow::new(d(start), d(end), "spy").unwrap()
    }

    #[test]
    fn window_rejects_inverted_dates() {
        let err = AnalysisWindow::new(d(5), d(1), "SPY").unwrap_err();
        assert!(matches!(err, FolioError::InvalidWindow { .. }));
    }

    #[test]
    fn window_uppercases_benchmark() {
        assert_eq!(window(1, 2).benchmark, "SPY");
    }

    #[test]
    fn gap_in_one_series_is_dropped_everywhere() {
        let mut prices = BTreeMap::new();
        prices.insert("A".to_string(), series("A", &[1, 2, 3, 4, 5]));
        prices.insert("B".to_string(), series("B", &[1, 2, 4, 5]));
        let bench = series("SPY", &[1, 2, 3, 4, 5]);
        let rf = series("RF", &[1, 2, 3, 4, 5]);

        let aligned = align(&window(1, 5), &prices, &bench, &rf).unwrap();
        assert_eq!(aligned.dates, vec![d(1), d(2), d(4), d(5)]);
        assert_eq!(aligned.prices["A"].len(), 4);
        assert_eq!(aligned.benchmark.len(), 4);
        assert_eq!(aligned.risk_free.len(), 4);
    }

    #[test]
    fn window_clips_series() {
        let mut prices = BTreeMap::new();
        prices.insert("A".to_string(), series("A", &[1, 2, 3, 4, 5, 6]));
        let bench = series("SPY", &[1, 2, 3, 4, 5, 6]);
        let rf = series("RF", &[1, 2, 3, 4, 5, 6]);

        let aligned = align(&window(2, 4), &prices, &bench, &rf).unwrap();
        assert_eq!(aligned.dates, vec![d(2), d(3), d(4)]);
    }

    #[test]
    fn series_empty_in_window_is_named() {
        let mut prices = BTreeMap::new();
        prices.insert("A".to_string(), series("A", &[1, 2, 3]));
        prices.insert("LATE".to_string(), series("LATE", &[20, 21]));
        let bench = series("SPY", &[1, 2, 3]);
        let rf = series("RF", &[1, 2, 3]);

        let err = align(&window(1, 10), &prices, &bench, &rf).unwrap_err();
        assert!(matches!(err, FolioError::Alignment { series, .. } if series == "LATE"));
    }

    #[test]
    fn disjoint_dates_fail() {
        let mut prices = BTreeMap::new();
        prices.insert("A".to_string(), series("A", &[1, 3, 5]));
        let bench = series("SPY", &[2, 4, 6]);
        let rf = series("RF", &[1, 2, 3, 4, 5, 6]);

        let err = align(&window(1, 6), &prices, &bench, &rf).unwrap_err();
        assert!(matches!(err, FolioError::Alignment { .. }));
    }

    #[test]
    fn risk_free_gaps_count() {
        let mut prices = BTreeMap::new();
        prices.insert("A".to_string(), series("A", &[1, 2, 3]));
        let bench = series("SPY", &[1, 2, 3]);
        let rf = series("RF", &[1, 3]);

        let aligned = align(&window(1, 3), &prices, &bench, &rf).unwrap();
        assert_eq!(aligned.dates, vec![d(1), d(3)]);
    }

    #[test]
    fn late_starting_holding_is_named() {
        let full: Vec<u32> = (1..=10).collect();
        let mut prices = BTreeMap::new();
        prices.insert("A".to_string(), series("A", &full));
        prices.insert("B".to_string(), series("B", &[7, 8, 9, 10]));
        let bench = series("SPY", &full);
        let rf = series("RF", &full);

        let err = align(&window(1, 10), &prices, &bench, &rf).unwrap_err();
        assert!(matches!(
            err,
            FolioError::Alignment { series, start, end }
                if series == "B" && start == d(1) && end == d(10)
        ));
    }

    #[test]
    fn early_ending_risk_free_is_named() {
        let mut prices = BTreeMap::new();
        prices.insert("A".to_string(), series("A", &[1, 2, 3, 4, 5]));
        let bench = series("SPY", &[1, 2, 3, 4, 5]);
        let rf = series("RF", &[1, 2, 3]);

        let err = align(&window(1, 5), &prices, &bench, &rf).unwrap_err();
        assert!(matches!(err, FolioError::Alignment { series, .. } if series == "RF"));
    }

    #[test]
    fn coverage_is_judged_inside_the_window() {
        let mut prices = BTreeMap::new();
        prices.insert("A".to_string(), series("A", &[1, 2, 3, 4, 5, 6]));
        prices.insert("B".to_string(), series("B", &[3, 4, 5]));
        let bench = series("SPY", &[1, 2, 3, 4, 5, 6]);
        let rf = series("RF", &[2, 3, 4, 5, 6]);

        let aligned = align(&window(3, 5), &prices, &bench, &rf).unwrap();
        assert_eq!(aligned.dates, vec![d(3), d(4), d(5)]);
    }
}
