//! Time-series access port trait.

use crate::domain::error::FolioError;
use crate::domain::series::{PriceSeries, RateSeries};
use chrono::NaiveDate;

/// Source of closing-price and risk-free-rate histories.
///
/// Returned series are ordered by date and limited to `start..=end`. An
/// unknown ticker yields an empty series, not an error; the analysis decides
/// whether an empty series is fatal.
pub trait TimeSeriesPort {
    fn fetch_prices(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, FolioError>;

    /// Daily rates as fractions.
    fn fetch_risk_free(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<RateSeries, FolioError>;

    fn list_tickers(&self) -> Result<Vec<String>, FolioError>;

    /// First date, last date and number of observations for `ticker`.
    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, FolioError>;
}
