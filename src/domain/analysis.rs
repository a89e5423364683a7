//! One analysis run: alignment, returns, aggregation, compounding, metrics.
//!
//! [`run_analysis`] is a pure function of its inputs. It performs no I/O;
//! callers load the series through a [`TimeSeriesPort`](crate::ports::time_series_port::TimeSeriesPort)
//! and hand them over in an [`AnalysisInput`].

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::aggregation::{equity_curve, weighted_returns};
use super::alignment::{align, AnalysisWindow};
use super::correlation::CorrelationMatrix;
use super::drawdown::{self, DrawdownReport};
use super::error::FolioError;
use super::metrics::{self, ReturnMetrics, DEFAULT_PERCENTILES};
use super::monthly::{monthly_returns, MonthlyReturn};
use super::portfolio::{Portfolio, DEFAULT_WEIGHT_TOLERANCE};
use super::returns::simple_returns;
use super::risk_free::annualized_rate;
use super::series::{PriceSeries, RateSeries, ReturnSeries, TimeSeries};
use crate::ports::time_series_port::TimeSeriesPort;

/// Two returns, so three common price dates.
pub const MIN_ALIGNED_DATES: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSettings {
    pub weight_tolerance: f64,
    pub percentiles: Vec<f64>,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            weight_tolerance: DEFAULT_WEIGHT_TOLERANCE,
            percentiles: DEFAULT_PERCENTILES.to_vec(),
        }
    }
}

/// Borrowed inputs of a run. `prices` may hold more tickers than the
/// portfolio; only held tickers are used.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisInput<'a> {
    pub portfolio: &'a Portfolio,
    pub window: &'a AnalysisWindow,
    pub prices: &'a BTreeMap<String, PriceSeries>,
    pub benchmark: &'a PriceSeries,
    pub risk_free: &'a RateSeries,
}

/// Series fetched from a store for one portfolio and window.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketData {
    pub prices: BTreeMap<String, PriceSeries>,
    pub benchmark: PriceSeries,
    pub risk_free: RateSeries,
}

impl MarketData {
    /// Fetches every held ticker, the benchmark and the risk-free rates for
    /// the window. Empty series are kept; alignment reports them.
    pub fn fetch(
        port: &dyn TimeSeriesPort,
        portfolio: &Portfolio,
        window: &AnalysisWindow,
    ) -> Result<Self, FolioError> {
        let mut prices = BTreeMap::new();
        for ticker in portfolio.tickers() {
            let series = port.fetch_prices(ticker, window.start, window.end)?;
            debug!(ticker, observations = series.len(), "fetched prices");
            prices.insert(ticker.to_string(), series);
        }
        let benchmark = port.fetch_prices(&window.benchmark, window.start, window.end)?;
        let risk_free = port.fetch_risk_free(window.start, window.end)?;
        debug!(
            benchmark = benchmark.len(),
            risk_free = risk_free.len(),
            "fetched benchmark and rates"
        );
        Ok(Self {
            prices,
            benchmark,
            risk_free,
        })
    }

    pub fn input<'a>(
        &'a self,
        portfolio: &'a Portfolio,
        window: &'a AnalysisWindow,
    ) -> AnalysisInput<'a> {
        AnalysisInput {
            portfolio,
            window,
            prices: &self.prices,
            benchmark: &self.benchmark,
            risk_free: &self.risk_free,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoldingMetrics {
    pub ticker: String,
    pub weight: f64,
    pub total_return: f64,
    pub annualized_return: f64,
    pub annualized_volatility: Option<f64>,
    pub beta: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsResult {
    pub portfolio_name: String,
    pub benchmark: String,
    /// First and last common dates actually used.
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub risk_free_rate: f64,
    #[serde(flatten)]
    pub metrics: ReturnMetrics,
    pub max_drawdown: f64,
    pub max_drawdown_date: Option<NaiveDate>,
    pub max_drawdown_peak_date: Option<NaiveDate>,
    pub current_drawdown: f64,
    pub longest_underwater_days: usize,
    pub holdings: Vec<HoldingMetrics>,
    pub correlation: CorrelationMatrix,
    pub monthly_returns: Vec<MonthlyReturn>,
    pub portfolio_equity: TimeSeries,
    pub benchmark_equity: TimeSeries,
    pub drawdown: TimeSeries,
}

fn holding_metrics(
    ticker: &str,
    weight: f64,
    returns: &ReturnSeries,
    benchmark: &ReturnSeries,
) -> HoldingMetrics {
    let r = returns.values();
    HoldingMetrics {
        ticker: ticker.to_string(),
        weight,
        total_return: metrics::total_return(&r),
        annualized_return: metrics::annualized_return(&r),
        annualized_volatility: metrics::annualized_volatility(&r),
        beta: metrics::beta(&r, &benchmark.values()),
    }
}

pub fn run_analysis(
    input: &AnalysisInput<'_>,
    settings: &AnalysisSettings,
) -> Result<MetricsResult, FolioError> {
    let portfolio = input.portfolio;
    let window = input.window;
    portfolio.validate(settings.weight_tolerance)?;

    let mut held: BTreeMap<String, PriceSeries> = BTreeMap::new();
    for ticker in portfolio.tickers() {
        let series = input
            .prices
            .get(ticker)
            .ok_or_else(|| FolioError::MissingSeries(ticker.to_string()))?;
        held.insert(ticker.to_string(), series.clone());
    }

    info!(
        portfolio = %portfolio.name,
        holdings = held.len(),
        benchmark = %window.benchmark,
        start = %window.start,
        end = %window.end,
        "running analysis"
    );

    let aligned = align(window, &held, input.benchmark, input.risk_free)?;
    let dates = &aligned.dates;
    if dates.len() < MIN_ALIGNED_DATES {
        return Err(FolioError::InsufficientData {
            context: "common timeline".to_string(),
            have: dates.len(),
            need: MIN_ALIGNED_DATES,
        });
    }
    let (base_date, end_date) = (dates[0], dates[dates.len() - 1]);
    debug!(
        common_dates = dates.len(),
        first = %base_date,
        last = %end_date,
        "aligned series"
    );

    let mut ticker_returns: BTreeMap<String, ReturnSeries> = BTreeMap::new();
    for (ticker, prices) in &aligned.prices {
        ticker_returns.insert(ticker.clone(), simple_returns(prices)?);
    }
    let benchmark_returns = simple_returns(&aligned.benchmark)?;

    let weights = portfolio.weights();
    let portfolio_returns = weighted_returns(&portfolio.name, &ticker_returns, &weights)?;
    let portfolio_equity = equity_curve(base_date, &portfolio_returns);
    let benchmark_equity = equity_curve(base_date, &benchmark_returns);

    // The first common date opens the first holding period and accrues nothing.
    let accrual = TimeSeries::from_ordered(
        aligned.risk_free.name(),
        aligned.risk_free.points()[1..].to_vec(),
    );
    let risk_free_rate = annualized_rate(&accrual)?;
    debug!(risk_free_rate, observations = accrual.len(), "compounded risk-free rate");

    let metrics = ReturnMetrics::compute(
        &portfolio_returns,
        &benchmark_returns,
        risk_free_rate,
        &settings.percentiles,
    )?;
    let DrawdownReport {
        series: drawdown,
        max_drawdown,
        trough_date,
        peak_date,
        current_drawdown,
        longest_underwater,
    } = drawdown::track(&portfolio_equity);

    let holdings = ticker_returns
        .iter()
        .map(|(ticker, r)| holding_metrics(ticker, weights[ticker], r, &benchmark_returns))
        .collect();

    info!(
        annualized_return = metrics.annualized_return,
        volatility = metrics.annualized_volatility,
        sharpe = ?metrics.sharpe_ratio,
        max_drawdown,
        "analysis complete"
    );

    Ok(MetricsResult {
        portfolio_name: portfolio.name.clone(),
        benchmark: window.benchmark.clone(),
        start_date: base_date,
        end_date,
        risk_free_rate,
        metrics,
        max_drawdown,
        max_drawdown_date: trough_date,
        max_drawdown_peak_date: peak_date,
        current_drawdown,
        longest_underwater_days: longest_underwater,
        holdings,
        correlation: CorrelationMatrix::compute(&ticker_returns),
        monthly_returns: monthly_returns(&portfolio_returns),
        portfolio_equity,
        benchmark_equity,
        drawdown,
    })
}
