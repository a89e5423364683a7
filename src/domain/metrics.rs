//! Risk/return metrics over aligned daily return series.
//!
//! Ratios that divide by a quantity which can be zero up to rounding
//! (volatility, benchmark variance, beta) are `Option<f64>`: `None` marks the
//! metric as undefined for the window and serializes as `null`. No NaN or
//! infinity is stored in a [`ReturnMetrics`].

use serde::Serialize;

use super::error::FolioError;
use super::series::ReturnSeries;
use super::statistics::{
    correlation, excess_kurtosis, mean, percentile, sample_covariance, sample_std,
    sample_variance, skewness,
};

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Fewest returns for which the sample statistics are defined.
pub const MIN_RETURNS: usize = 2;

pub const DEFAULT_PERCENTILES: [f64; 5] = [5.0, 25.0, 50.0, 75.0, 95.0];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PercentileValue {
    pub percentile: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionStats {
    pub mean: f64,
    pub std_dev: f64,
    pub skewness: Option<f64>,
    pub excess_kurtosis: Option<f64>,
    pub min: f64,
    pub max: f64,
    pub up_days_pct: f64,
    pub percentiles: Vec<PercentileValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnMetrics {
    pub observations: usize,
    pub total_return: f64,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    pub sharpe_ratio: Option<f64>,
    pub beta: Option<f64>,
    pub alpha: Option<f64>,
    pub treynor_ratio: Option<f64>,
    pub benchmark_annualized_return: f64,
    pub benchmark_volatility: f64,
    pub benchmark_correlation: Option<f64>,
    pub distribution: DistributionStats,
}

fn defined(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// `prod(1 + r) - 1`.
pub fn total_return(returns: &[f64]) -> f64 {
    returns.iter().map(|r| 1.0 + r).product::<f64>() - 1.0
}

/// `(E_final / E_initial) ^ (252 / n) - 1`, with `n` the number of returns.
pub fn annualized_return(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let growth = 1.0 + total_return(returns);
    if growth <= 0.0 {
        return -1.0;
    }
    growth.powf(TRADING_DAYS_PER_YEAR / returns.len() as f64) - 1.0
}

/// Sample standard deviation scaled by `sqrt(252)`.
pub fn annualized_volatility(returns: &[f64]) -> Option<f64> {
    sample_std(returns).map(|s| s * TRADING_DAYS_PER_YEAR.sqrt())
}

/// `Cov(r_p, r_m) / Var(r_m)`; `None` when the benchmark has zero variance.
pub fn beta(portfolio: &[f64], benchmark: &[f64]) -> Option<f64> {
    let var_m = sample_variance(benchmark)?;
    if var_m == 0.0 {
        return None;
    }
    defined(sample_covariance(portfolio, benchmark)? / var_m)
}

fn distribution(returns: &[f64], mean_daily: f64, std_daily: f64, percentiles: &[f64]) -> DistributionStats {
    let min = returns.iter().copied().fold(f64::INFINITY, f64::min);
    let max = returns.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let up_days = returns.iter().filter(|r| **r > 0.0).count();

    DistributionStats {
        mean: mean_daily,
        std_dev: std_daily,
        skewness: skewness(returns),
        excess_kurtosis: excess_kurtosis(returns),
        min,
        max,
        up_days_pct: up_days as f64 / returns.len() as f64,
        percentiles: percentiles
            .iter()
            .filter_map(|&p| {
                percentile(returns, p).map(|value| PercentileValue {
                    percentile: p,
                    value,
                })
            })
            .collect(),
    }
}

impl ReturnMetrics {
    /// Computes every metric for `portfolio` against `benchmark`, both
    /// indexed on the same dates, with `risk_free_rate` already annualized.
    pub fn compute(
        portfolio: &ReturnSeries,
        benchmark: &ReturnSeries,
        risk_free_rate: f64,
        percentiles: &[f64],
    ) -> Result<Self, FolioError> {
        if let Some(bad) = percentiles.iter().find(|p| !(0.0..=100.0).contains(*p)) {
            return Err(FolioError::ConfigInvalid {
                section: "analysis".into(),
                key: "percentiles".into(),
                reason: format!("{bad} is outside 0..=100"),
            });
        }

        let rp = portfolio.values();
        let rm = benchmark.values();
        let n = rp.len();
        if n < MIN_RETURNS {
            return Err(FolioError::InsufficientData {
                context: format!("{} returns", portfolio.name()),
                have: n,
                need: MIN_RETURNS,
            });
        }
        if rm.len() != n || portfolio.dates().zip(benchmark.dates()).any(|(a, b)| a != b) {
            return Err(FolioError::Alignment {
                series: benchmark.name().to_string(),
                start: portfolio.first_date().unwrap_or_default(),
                end: portfolio.last_date().unwrap_or_default(),
            });
        }
        if let Some(bad) = portfolio
            .points()
            .iter()
            .chain(benchmark.points())
            .find(|o| !o.value.is_finite())
        {
            return Err(FolioError::DataIntegrity {
                series: portfolio.name().to_string(),
                date: bad.date,
                value: bad.value,
            });
        }

        // n >= 2 so mean and std are defined.
        let mean_p = mean(&rp).unwrap_or(0.0);
        let mean_m = mean(&rm).unwrap_or(0.0);
        let std_p = sample_std(&rp).unwrap_or(0.0);
        let std_m = sample_std(&rm).unwrap_or(0.0);
        let sqrt_days = TRADING_DAYS_PER_YEAR.sqrt();

        let annualized_volatility = std_p * sqrt_days;
        let excess_return = mean_p * TRADING_DAYS_PER_YEAR - risk_free_rate;

        let sharpe_ratio = if annualized_volatility == 0.0 {
            None
        } else {
            defined(excess_return / annualized_volatility)
        };

        let beta = beta(&rp, &rm);
        let alpha = beta.and_then(|b| {
            defined(
                mean_p * TRADING_DAYS_PER_YEAR
                    - (risk_free_rate + b * (mean_m * TRADING_DAYS_PER_YEAR - risk_free_rate)),
            )
        });
        let treynor_ratio = beta
            .filter(|b| *b != 0.0)
            .and_then(|b| defined(excess_return / b));

        Ok(ReturnMetrics {
            observations: n,
            total_return: total_return(&rp),
            annualized_return: annualized_return(&rp),
            annualized_volatility,
            sharpe_ratio,
            beta,
            alpha,
            treynor_ratio,
            benchmark_annualized_return: annualized_return(&rm),
            benchmark_volatility: std_m * sqrt_days,
            benchmark_correlation: correlation(&rp, &rm),
            distribution: distribution(&rp, mean_p, std_p, percentiles),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::series::TimeSeries;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn returns(name: &str, values: &[f64]) -> ReturnSeries {
        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let pairs: Vec<_> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| (start + chrono::Duration::days(i as i64), v))
            .collect();
        TimeSeries::from_pairs(name, &pairs).unwrap()
    }

    fn market() -> Vec<f64> {
        vec![0.01, -0.005, 0.007, 0.002, -0.012, 0.015, 0.003, -0.001]
    }

    #[test]
    fn annualized_return_uses_observed_days() {
        // 1% over a single day annualizes to 1.01^252 - 1.
        assert_relative_eq!(
            annualized_return(&[0.01]),
            1.01_f64.powf(252.0) - 1.0,
            max_relative = 1e-12
        );
        let flat = vec![0.0; 252];
        assert_eq!(annualized_return(&flat), 0.0);
    }

    #[test]
    fn annualized_return_total_loss() {
        assert_eq!(annualized_return(&[0.1, -1.0]), -1.0);
    }

    #[test]
    fn volatility_is_sample_std_times_sqrt_252() {
        let r = [0.01, -0.01, 0.02, 0.0];
        let expected = sample_std(&r).unwrap() * 252.0_f64.sqrt();
        assert_relative_eq!(annualized_volatility(&r).unwrap(), expected);
    }

    #[test]
    fn sharpe_formula() {
        let rp = returns("P", &market());
        let rm = returns("M", &market());
        let m = ReturnMetrics::compute(&rp, &rm, 0.03, &DEFAULT_PERCENTILES).unwrap();

        let v = market();
        let expected = (mean(&v).unwrap() * 252.0 - 0.03)
            / (sample_std(&v).unwrap() * 252.0_f64.sqrt());
        assert_relative_eq!(m.sharpe_ratio.unwrap(), expected, max_relative = 1e-12);
    }

    #[test]
    fn identical_series_has_unit_beta_and_zero_alpha() {
        let rp = returns("P", &market());
        let rm = returns("M", &market());
        let m = ReturnMetrics::compute(&rp, &rm, 0.04, &DEFAULT_PERCENTILES).unwrap();
        assert_relative_eq!(m.beta.unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(m.alpha.unwrap(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(m.benchmark_correlation.unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn leveraged_series_has_double_beta() {
        let doubled: Vec<f64> = market().iter().map(|r| 2.0 * r).collect();
        let rp = returns("P", &doubled);
        let rm = returns("M", &market());
        let m = ReturnMetrics::compute(&rp, &rm, 0.0, &[]).unwrap();
        assert_relative_eq!(m.beta.unwrap(), 2.0, epsilon = 1e-12);
        let treynor = m.treynor_ratio.unwrap();
        let expected = mean(&doubled).unwrap() * 252.0 / 2.0;
        assert_relative_eq!(treynor, expected, max_relative = 1e-12);
    }

    #[test]
    fn constant_returns_have_undefined_sharpe() {
        let rp = returns("P", &[0.001; 8]);
        let rm = returns("M", &market());
        let m = ReturnMetrics::compute(&rp, &rm, 0.02, &DEFAULT_PERCENTILES).unwrap();
        assert_eq!(m.annualized_volatility, 0.0);
        assert_eq!(m.sharpe_ratio, None);
        assert_eq!(m.distribution.skewness, None);
        assert_eq!(m.benchmark_correlation, None);
        // beta is defined (covariance is zero), treynor is not
        assert_eq!(m.beta, Some(0.0));
        assert_eq!(m.treynor_ratio, None);
    }

    #[test]
    fn flat_benchmark_has_undefined_beta_alpha_treynor() {
        let rp = returns("P", &market());
        let rm = returns("M", &[0.0; 8]);
        let m = ReturnMetrics::compute(&rp, &rm, 0.02, &DEFAULT_PERCENTILES).unwrap();
        assert_eq!(m.beta, None);
        assert_eq!(m.alpha, None);
        assert_eq!(m.treynor_ratio, None);
        assert!(m.sharpe_ratio.is_some());
    }

    fn steady_growth_returns(name: &str) -> ReturnSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let pairs: Vec<_> = (0..9)
            .map(|i| (start + chrono::Duration::days(i as i64), 100.0 * 1.01_f64.powi(i)))
            .collect();
        let prices = TimeSeries::from_pairs(name, &pairs).unwrap();
        crate::domain::returns::simple_returns(&prices).unwrap()
    }

    #[test]
    fn steady_growth_has_zero_volatility_and_no_sharpe() {
        let rp = steady_growth_returns("P");
        let rm = returns("M", &market());
        let m = ReturnMetrics::compute(&rp, &rm, 0.02, &DEFAULT_PERCENTILES).unwrap();
        assert_eq!(m.annualized_volatility, 0.0);
        assert_eq!(m.sharpe_ratio, None);
        assert_eq!(m.distribution.skewness, None);
        assert_eq!(m.distribution.excess_kurtosis, None);
        assert_eq!(m.benchmark_correlation, None);
    }

    #[test]
    fn steady_growth_benchmark_has_undefined_beta() {
        let rp = returns("P", &market());
        let rm = steady_growth_returns("M");
        let m = ReturnMetrics::compute(&rp, &rm, 0.02, &DEFAULT_PERCENTILES).unwrap();
        assert_eq!(m.beta, None);
        assert_eq!(m.alpha, None);
        assert_eq!(m.treynor_ratio, None);
        assert_eq!(m.benchmark_volatility, 0.0);
    }

    #[test]
    fn distribution_stats() {
        let rp = returns("P", &market());
        let m = ReturnMetrics::compute(&rp, &rp, 0.0, &[50.0]).unwrap();
        let d = &m.distribution;
        assert_relative_eq!(d.min, -0.012);
        assert_relative_eq!(d.max, 0.015);
        assert_relative_eq!(d.up_days_pct, 5.0 / 8.0);
        assert_eq!(d.percentiles.len(), 1);
        assert_relative_eq!(d.percentiles[0].value, 0.0025, epsilon = 1e-12);
        assert!(d.skewness.is_some());
        assert!(d.excess_kurtosis.is_some());
    }

    #[test]
    fn single_return_is_insufficient() {
        let rp = returns("P", &[0.01]);
        let err = ReturnMetrics::compute(&rp, &rp, 0.0, &[]).unwrap_err();
        assert!(matches!(err, FolioError::InsufficientData { have: 1, need: 2, .. }));
    }

    #[test]
    fn mismatched_benchmark_dates_rejected() {
        let rp = returns("P", &[0.01, 0.02, 0.03]);
        let rm = returns("M", &[0.01, 0.02]);
        let err = ReturnMetrics::compute(&rp, &rm, 0.0, &[]).unwrap_err();
        assert!(matches!(err, FolioError::Alignment { series, .. } if series == "M"));
    }

    #[test]
    fn invalid_percentile_rejected() {
        let rp = returns("P", &market());
        let err = ReturnMetrics::compute(&rp, &rp, 0.0, &[50.0, 150.0]).unwrap_err();
        assert!(matches!(err, FolioError::ConfigInvalid { key, .. } if key == "percentiles"));
    }
}
