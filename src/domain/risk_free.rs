//! Compounding of a daily risk-free rate series into an annual rate.

use super::error::FolioError;
use super::metrics::TRADING_DAYS_PER_YEAR;
use super::series::RateSeries;

/// Annualized realized rate over the observations in `rates`:
///
/// `(prod(1 + rate_i / 252)) ^ (252 / n) - 1`
///
/// The product is accumulated as a sum of `ln_1p` terms and converted back
/// with `exp_m1`, which keeps full precision for long windows of
/// near-zero daily accruals.
pub fn annualized_rate(rates: &RateSeries) -> Result<f64, FolioError> {
    let n = rates.len();
    if n == 0 {
        return Err(FolioError::InsufficientData {
            context: format!("{} rates", rates.name()),
            have: 0,
            need: 1,
        });
    }

    let mut log_growth = 0.0_f64;
    for obs in rates.points() {
        let daily = obs.value / TRADING_DAYS_PER_YEAR;
        if !obs.value.is_finite() || daily <= -1.0 {
            return Err(FolioError::DataIntegrity {
                series: rates.name().to_string(),
                date: obs.date,
                value: obs.value,
            });
        }
        log_growth += daily.ln_1p();
    }

    Ok((log_growth * TRADING_DAYS_PER_YEAR / n as f64).exp_m1())
}
