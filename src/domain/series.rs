//! Date-indexed series shared by prices, returns and rates.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::error::FolioError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// An ordered series of observations with strictly increasing dates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    name: String,
    points: Vec<Observation>,
}

/// Closing prices for one ticker.
pub type PriceSeries = TimeSeries;
/// Simple period returns, one entry shorter than the prices they came from.
pub type ReturnSeries = TimeSeries;
/// Daily risk-free rates as fractions (0.0531 for 5.31%).
pub type RateSeries = TimeSeries;

impl TimeSeries {
    pub fn new(name: impl Into<String>, points: Vec<Observation>) -> Result<Self, FolioError> {
        let name = name.into();
        for pair in points.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(FolioError::UnorderedSeries {
                    series: name,
                    date: pair[1].date,
                });
            }
        }
        Ok(Self { name, points })
    }

    pub fn from_pairs(
        name: impl Into<String>,
        pairs: &[(NaiveDate, f64)],
    ) -> Result<Self, FolioError> {
        let points = pairs
            .iter()
            .map(|&(date, value)| Observation { date, value })
            .collect();
        Self::new(name, points)
    }

    /// Builds a series that is already known to be ordered, e.g. a filtered
    /// or derived copy of another series.
    pub(crate) fn from_ordered(name: impl Into<String>, points: Vec<Observation>) -> Self {
        debug_assert!(points.windows(2).all(|w| w[0].date < w[1].date));
        Self {
            name: name.into(),
            points,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn points(&self) -> &[Observation] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|p| p.date)
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Observations with `start <= date <= end`.
    pub fn within(&self, start: NaiveDate, end: NaiveDate) -> TimeSeries {
        let points = self
            .points
            .iter()
            .filter(|p| p.date >= start && p.date <= end)
            .copied()
            .collect();
        TimeSeries::from_ordered(self.name.clone(), points)
    }

    /// Observations whose date is in `dates`.
    pub fn restrict_to(&self, dates: &BTreeSet<NaiveDate>) -> TimeSeries {
        let points = self
            .points
            .iter()
            .filter(|p| dates.contains(&p.date))
            .copied()
            .collect();
        TimeSeries::from_ordered(self.name.clone(), points)
    }
}
