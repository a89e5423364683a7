//! Property tests for the numeric core.
//!
//! Tests cover:
//! - Prices rebuilt from returns and an equity curve
//! - Drawdown bounds
//! - Weight normalization under rescaling
//! - Aggregation of identical holdings
//! - Percentile ordering and bounds
//! - Constant-rate compounding
//! - Beta of a series against itself

mod common;

use approx::relative_eq;
use chrono::{Days, NaiveDate};
use common::portfolio;
use folioscope::domain::aggregation::{equity_curve, weighted_returns};
use folioscope::domain::drawdown;
use folioscope::domain::metrics::beta;
use folioscope::domain::returns::simple_returns;
use folioscope::domain::risk_free::annualized_rate;
use folioscope::domain::series::TimeSeries;
use folioscope::domain::statistics::{percentile, sample_variance};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn dated(name: &str, values: &[f64]) -> TimeSeries {
    let base = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    let pairs: Vec<(NaiveDate, f64)> = values
        .iter()
        .enumerate()
        .map(|(i, &v)| (base + Days::new(i as u64), v))
        .collect();
    TimeSeries::from_pairs(name, &pairs).unwrap()
}

fn prices() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0f64..1000.0, 2..60)
}

proptest! {
    #[test]
    fn equity_curve_rebuilds_prices(p in prices()) {
        let series = dated("X", &p);
        let returns = simple_returns(&series).unwrap();
        let curve = equity_curve(series.first_date().unwrap(), &returns);

        prop_assert_eq!(curve.len(), p.len());
        for (obs, price) in curve.points().iter().zip(&p) {
            prop_assert!(relative_eq!(obs.value * p[0], *price, max_relative = 1e-9));
        }
    }

    #[test]
    fn drawdown_stays_in_unit_interval(p in prices()) {
        let report = drawdown::track(&dated("X", &p));
        prop_assert!(report.max_drawdown >= 0.0 && report.max_drawdown < 1.0);
        prop_assert_eq!(report.series.len(), p.len());
        let deepest = report.series.values().into_iter().fold(0.0, f64::max);
        prop_assert_eq!(deepest, report.max_drawdown);
        prop_assert_eq!(report.series.points()[0].value, 0.0);
        prop_assert!(report.current_drawdown <= report.max_drawdown);
        let never_falls = p.windows(2).all(|w| w[1] >= w[0]);
        prop_assert_eq!(report.max_drawdown == 0.0, never_falls);
    }

    #[test]
    fn normalization_ignores_scale(
        weights in prop::collection::vec(0.01f64..10.0, 1..8),
        scale in 0.1f64..100.0,
    ) {
        let tickers: Vec<String> = (0..weights.len()).map(|i| format!("T{}", i)).collect();
        let base: Vec<(&str, f64)> = tickers
            .iter()
            .map(String::as_str)
            .zip(weights.iter().copied())
            .collect();
        let other: Vec<(&str, f64)> = base.iter().map(|(t, w)| (*t, w * scale)).collect();

        let a = portfolio("A", &base).normalized().unwrap();
        let b = portfolio("B", &other).normalized().unwrap();
        prop_assert!(relative_eq!(a.total_weight(), 1.0, epsilon = 1e-12));
        prop_assert!(a.validate(1e-9).is_ok());
        for (ticker, w) in a.weights() {
            prop_assert!(relative_eq!(w, b.weight(&ticker).unwrap(), max_relative = 1e-12));
        }
    }

    #[test]
    fn identical_holdings_aggregate_to_themselves(
        p in prices(),
        split in 0.0f64..=1.0,
    ) {
        let returns = simple_returns(&dated("X", &p)).unwrap();
        let mut by_ticker = BTreeMap::new();
        by_ticker.insert("A".to_string(), returns.clone());
        by_ticker.insert("B".to_string(), returns.clone());
        let mut weights = BTreeMap::new();
        weights.insert("A".to_string(), split);
        weights.insert("B".to_string(), 1.0 - split);

        let combined = weighted_returns("P", &by_ticker, &weights).unwrap();
        for (c, r) in combined.points().iter().zip(returns.points()) {
            prop_assert_eq!(c.date, r.date);
            prop_assert!(relative_eq!(c.value, r.value, epsilon = 1e-12, max_relative = 1e-9));
        }
    }

    #[test]
    fn percentiles_are_ordered_and_bounded(
        values in prop::collection::vec(-0.2f64..0.2, 1..100),
        lo in 0.0f64..=100.0,
        hi in 0.0f64..=100.0,
    ) {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        let a = percentile(&values, lo).unwrap();
        let b = percentile(&values, hi).unwrap();
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(a <= b + 1e-15);
        prop_assert!(a >= min - 1e-15 && b <= max + 1e-15);
        prop_assert_eq!(percentile(&values, 0.0).unwrap(), min);
        prop_assert_eq!(percentile(&values, 100.0).unwrap(), max);
    }

    #[test]
    fn constant_rate_compounds_independent_of_length(
        rate in 0.0f64..0.1,
        n in 1usize..500,
    ) {
        let rates = dated("RF", &vec![rate; n]);
        let annual = annualized_rate(&rates).unwrap();
        let expected = (1.0 + rate / 252.0).powf(252.0) - 1.0;
        prop_assert!(relative_eq!(annual, expected, epsilon = 1e-14, max_relative = 1e-9));
    }

    #[test]
    fn beta_against_itself_is_one(returns in prop::collection::vec(-0.1f64..0.1, 3..50)) {
        prop_assume!(sample_variance(&returns).is_some_and(|v| v > 1e-12));
        let b = beta(&returns, &returns).unwrap();
        prop_assert!(relative_eq!(b, 1.0, max_relative = 1e-9));
    }
}
