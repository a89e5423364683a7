//! Price-to-return conversion.

use super::error::FolioError;
use super::series::{Observation, PriceSeries, ReturnSeries, TimeSeries};

pub const MIN_PRICES: usize = 2;

/// `(P_i - P_{i-1}) / P_{i-1}` for each consecutive pair of prices.
///
/// Every price must be finite and strictly positive; the first offending
/// observation is reported as [`FolioError::DataIntegrity`].
pub fn simple_returns(prices: &PriceSeries) -> Result<ReturnSeries, FolioError> {
    if prices.len() < MIN_PRICES {
        return Err(FolioError::InsufficientData {
            context: format!("{} prices", prices.name()),
            have: prices.len(),
            need: MIN_PRICES,
        });
    }

    if let Some(bad) = prices
        .points()
        .iter()
        .find(|p| !p.value.is_finite() || p.value <= 0.0)
    {
        return Err(FolioError::DataIntegrity {
            series: prices.name().to_string(),
            date: bad.date,
            value: bad.value,
        });
    }

    let points = prices
        .points()
        .windows(2)
        .map(|w| Observation::new(w[1].date, (w[1].value - w[0].value) / w[0].value))
        .collect();

    Ok(TimeSeries::from_ordered(prices.name(), points))
}
