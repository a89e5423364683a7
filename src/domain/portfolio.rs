//! Portfolio definition: ordered, uniquely-keyed ticker weights.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use super::error::FolioError;

/// Default tolerance on `|sum(weights) - 1|`.
pub const DEFAULT_WEIGHT_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub ticker: String,
    pub weight: f64,
}

impl Position {
    pub fn new(ticker: impl Into<String>, weight: f64) -> Self {
        Self {
            ticker: ticker.into(),
            weight,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub name: String,
    positions: Vec<Position>,
}

/// JSON interchange shape: `{"name": ..., "holdings": {"AAPL": 0.5, ...}}`.
#[derive(Debug, Serialize, Deserialize)]
struct PortfolioDocument {
    #[serde(default = "default_name")]
    name: String,
    #[serde(default)]
    holdings: BTreeMap<String, f64>,
}

fn default_name() -> String {
    "Portfolio".to_string()
}

fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

impl Portfolio {
    pub fn new(name: impl Into<String>) -> Self {
        Portfolio {
            name: name.into(),
            positions: Vec::new(),
        }
    }

    /// Builds a portfolio, rejecting duplicate tickers. Tickers are upper-cased.
    pub fn from_positions(
        name: impl Into<String>,
        positions: Vec<Position>,
    ) -> Result<Self, FolioError> {
        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(positions.len());
        for pos in positions {
            let ticker = normalize_ticker(&pos.ticker);
            if !seen.insert(ticker.clone()) {
                return Err(FolioError::DuplicateTicker(ticker));
            }
            out.push(Position {
                ticker,
                weight: pos.weight,
            });
        }
        Ok(Portfolio {
            name: name.into(),
            positions: out,
        })
    }

    /// `1/N` weight on every ticker.
    pub fn equal_weight(name: impl Into<String>, tickers: &[&str]) -> Result<Self, FolioError> {
        if tickers.is_empty() {
            return Err(FolioError::EmptyPortfolio);
        }
        let weight = 1.0 / tickers.len() as f64;
        let positions = tickers
            .iter()
            .map(|t| Position {
                ticker: t.to_string(),
                weight,
            })
            .collect();
        Self::from_positions(name, positions)
    }

    /// Inserts a ticker, or overwrites its weight if already held.
    pub fn add_ticker(&mut self, ticker: &str, weight: f64) {
        let ticker = normalize_ticker(ticker);
        match self.positions.iter_mut().find(|p| p.ticker == ticker) {
            Some(existing) => existing.weight = weight,
            None => self.positions.push(Position { ticker, weight }),
        }
    }

    pub fn remove_ticker(&mut self, ticker: &str) -> Option<Position> {
        let ticker = normalize_ticker(ticker);
        let idx = self.positions.iter().position(|p| p.ticker == ticker)?;
        Some(self.positions.remove(idx))
    }

    pub fn update_weight(&mut self, ticker: &str, weight: f64) -> Result<(), FolioError> {
        let ticker = normalize_ticker(ticker);
        match self.positions.iter_mut().find(|p| p.ticker == ticker) {
            Some(existing) => {
                existing.weight = weight;
                Ok(())
            }
            None => Err(FolioError::UnknownTicker(ticker)),
        }
    }

    pub fn clear(&mut self) {
        self.positions.clear();
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn tickers(&self) -> Vec<&str> {
        self.positions.iter().map(|p| p.ticker.as_str()).collect()
    }

    pub fn weight(&self, ticker: &str) -> Option<f64> {
        let ticker = normalize_ticker(ticker);
        self.positions
            .iter()
            .find(|p| p.ticker == ticker)
            .map(|p| p.weight)
    }

    pub fn total_weight(&self) -> f64 {
        self.positions.iter().map(|p| p.weight).sum()
    }

    /// Weight vector keyed by ticker.
    pub fn weights(&self) -> BTreeMap<String, f64> {
        self.positions
            .iter()
            .map(|p| (p.ticker.clone(), p.weight))
            .collect()
    }

    /// Rescales weights so they sum to 1.
    pub fn normalize(&mut self) -> Result<(), FolioError> {
        if self.positions.is_empty() {
            return Ok(());
        }
        let total = self.total_weight();
        if total == 0.0 || !total.is_finite() {
            return Err(FolioError::WeightSum {
                total,
                tolerance: DEFAULT_WEIGHT_TOLERANCE,
            });
        }
        for pos in &mut self.positions {
            pos.weight /= total;
        }
        Ok(())
    }

    pub fn normalized(&self) -> Result<Portfolio, FolioError> {
        let mut copy = self.clone();
        copy.normalize()?;
        Ok(copy)
    }

    /// Checks the invariants the analytics engine relies on. Does not
    /// renormalize.
    pub fn validate(&self, tolerance: f64) -> Result<(), FolioError> {
        if self.positions.is_empty() {
            return Err(FolioError::EmptyPortfolio);
        }

        let mut seen = HashSet::new();
        for pos in &self.positions {
            if !seen.insert(pos.ticker.as_str()) {
                return Err(FolioError::DuplicateTicker(pos.ticker.clone()));
            }
            if !pos.weight.is_finite() || pos.weight < 0.0 {
                return Err(FolioError::InvalidWeight {
                    ticker: pos.ticker.clone(),
                    weight: pos.weight,
                });
            }
        }

        let total = self.total_weight();
        if (total - 1.0).abs() > tolerance {
            return Err(FolioError::WeightSum { total, tolerance });
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let doc = PortfolioDocument {
            name: self.name.clone(),
            holdings: self.weights(),
        };
        serde_json::to_string_pretty(&doc)
    }

    /// Parses the JSON document form. Holdings come back in ticker order.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let doc: PortfolioDocument = serde_json::from_str(json)?;
        let mut portfolio = Portfolio::new(doc.name);
        for (ticker, weight) in doc.holdings {
            portfolio.add_ticker(&ticker, weight);
        }
        Ok(portfolio)
    }
}
