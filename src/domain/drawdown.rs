//! Running-peak drawdown over an equity curve.

use chrono::NaiveDate;
use serde::Serialize;

use super::series::{Observation, TimeSeries};

/// Left-to-right fold over an equity curve. Each step depends on the peak
/// carried from the previous one.
#[derive(Debug, Clone, Default)]
pub struct DrawdownTracker {
    peak: Option<(NaiveDate, f64)>,
    max_drawdown: f64,
    trough_date: Option<NaiveDate>,
    peak_before_trough: Option<NaiveDate>,
    underwater: usize,
    longest_underwater: usize,
    series: Vec<Observation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawdownReport {
    /// `(peak - E(t)) / peak` for every point of the curve, as a positive fraction.
    pub series: TimeSeries,
    pub max_drawdown: f64,
    /// Date of the deepest point; `None` when the curve never fell.
    pub trough_date: Option<NaiveDate>,
    /// High-water-mark date preceding the deepest point.
    pub peak_date: Option<NaiveDate>,
    /// Drawdown at the last point (distance from the high water mark).
    pub current_drawdown: f64,
    /// Longest run of consecutive observations below a prior peak.
    pub longest_underwater: usize,
}

impl DrawdownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds the next point of the curve and returns its drawdown.
    pub fn observe(&mut self, date: NaiveDate, equity: f64) -> f64 {
        let (peak_date, peak) = match self.peak {
            Some((pd, p)) if p >= equity => (pd, p),
            _ => {
                self.peak = Some((date, equity));
                (date, equity)
            }
        };

        let drawdown = if peak > 0.0 {
            (peak - equity) / peak
        } else {
            0.0
        };

        if drawdown > 0.0 {
            self.underwater += 1;
            self.longest_underwater = self.longest_underwater.max(self.underwater);
        } else {
            self.underwater = 0;
        }

        if drawdown > self.max_drawdown {
            self.max_drawdown = drawdown;
            self.trough_date = Some(date);
            self.peak_before_trough = Some(peak_date);
        }

        self.series.push(Observation::new(date, drawdown));
        drawdown
    }

    pub fn max_drawdown(&self) -> f64 {
        self.max_drawdown
    }

    pub fn finish(self) -> DrawdownReport {
        let current_drawdown = self.series.last().map(|o| o.value).unwrap_or(0.0);
        DrawdownReport {
            series: TimeSeries::from_ordered("drawdown", self.series),
            max_drawdown: self.max_drawdown,
            trough_date: self.trough_date,
            peak_date: self.peak_before_trough,
            current_drawdown,
            longest_underwater: self.longest_underwater,
        }
    }
}

/// Runs a [`DrawdownTracker`] over the whole curve.
pub fn track(curve: &TimeSeries) -> DrawdownReport {
    let mut tracker = DrawdownTracker::new();
    for obs in curve.points() {
        tracker.observe(obs.date, obs.value);
    }
    tracker.finish()
}
