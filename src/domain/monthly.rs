//! Calendar-month compounding of daily returns.

use chrono::Datelike;
use serde::Serialize;

use super::series::ReturnSeries;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthlyReturn {
    pub year: i32,
    pub month: u32,
    pub value: f64,
}

/// `prod(1 + r) - 1` for each calendar month that has at least one return,
/// in chronological order.
pub fn monthly_returns(returns: &ReturnSeries) -> Vec<MonthlyReturn> {
    let mut table: Vec<MonthlyReturn> = Vec::new();
    let mut growth = 1.0;

    for obs in returns.points() {
        let (year, month) = (obs.date.year(), obs.date.month());
        match table.last_mut() {
            Some(last) if last.year == year && last.month == month => {
                growth *= 1.0 + obs.value;
                last.value = growth - 1.0;
            }
            _ => {
                growth = 1.0 + obs.value;
                table.push(MonthlyReturn {
                    year,
                    month,
                    value: growth - 1.0,
                });
            }
        }
    }

    table
}
