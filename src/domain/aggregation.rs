//! Weighted portfolio returns and equity curves.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::error::FolioError;
use super::series::{Observation, ReturnSeries, TimeSeries};

/// `r_p(t) = sum(weight(ticker) * r_ticker(t))` over a shared date index.
///
/// The key sets of `returns` and `weights` must match exactly. Terms are
/// summed in ticker order so the result is reproducible bit for bit.
pub fn weighted_returns(
    name: &str,
    returns: &BTreeMap<String, ReturnSeries>,
    weights: &BTreeMap<String, f64>,
) -> Result<ReturnSeries, FolioError> {
    let missing_weights: Vec<String> = returns
        .keys()
        .filter(|t| !weights.contains_key(*t))
        .cloned()
        .collect();
    let missing_returns: Vec<String> = weights
        .keys()
        .filter(|t| !returns.contains_key(*t))
        .cloned()
        .collect();
    if !missing_weights.is_empty() || !missing_returns.is_empty() {
        return Err(FolioError::WeightMismatch {
            missing_weights,
            missing_returns,
        });
    }

    let reference = returns.values().next().ok_or(FolioError::EmptyPortfolio)?;
    let (Some(start), Some(end)) = (reference.first_date(), reference.last_date()) else {
        return Err(FolioError::InsufficientData {
            context: format!("{} returns", reference.name()),
            have: 0,
            need: 1,
        });
    };

    for series in returns.values() {
        if series.len() != reference.len()
            || series.dates().zip(reference.dates()).any(|(a, b)| a != b)
        {
            return Err(FolioError::Alignment {
                series: series.name().to_string(),
                start,
                end,
            });
        }
    }

    let points = reference
        .points()
        .iter()
        .enumerate()
        .map(|(i, obs)| {
            let value = returns
                .iter()
                .map(|(ticker, series)| weights[ticker] * series.points()[i].value)
                .sum();
            Observation::new(obs.date, value)
        })
        .collect();

    Ok(TimeSeries::from_ordered(name, points))
}

/// Compounds returns into a curve starting at 1.0 on `base_date`:
/// `E(0) = 1`, `E(t) = E(t-1) * (1 + r(t))`.
pub fn equity_curve(base_date: NaiveDate, returns: &ReturnSeries) -> TimeSeries {
    let mut points = Vec::with_capacity(returns.len() + 1);
    points.push(Observation::new(base_date, 1.0));
    let mut equity = 1.0;
    for obs in returns.points() {
        equity *= 1.0 + obs.value;
        points.push(Observation::new(obs.date, equity));
    }
    TimeSeries::from_ordered(returns.name(), points)
}
