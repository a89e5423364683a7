//! Pairwise Pearson correlation of the aligned holding returns.

use serde::Serialize;
use std::collections::BTreeMap;

use super::series::ReturnSeries;
use super::statistics::correlation;

/// Square matrix in ticker order. An entry is `None` when either side has
/// zero variance over the window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub tickers: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn compute(returns: &BTreeMap<String, ReturnSeries>) -> Self {
        let tickers: Vec<String> = returns.keys().cloned().collect();
        let columns: Vec<Vec<f64>> = returns.values().map(|s| s.values()).collect();
        let n = columns.len();

        let mut values = vec![vec![None; n]; n];
        for i in 0..n {
            for j in i..n {
                let rho = if i == j {
                    correlation(&columns[i], &columns[i]).map(|_| 1.0)
                } else {
                    correlation(&columns[i], &columns[j])
                };
                values[i][j] = rho;
                values[j][i] = rho;
            }
        }

        Self { tickers, values }
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.tickers.iter().position(|t| t == a)?;
        let j = self.tickers.iter().position(|t| t == b)?;
        self.values[i][j]
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }
}
