//! Portfolio definitions on disk: JSON documents and `Ticker,Weight` CSV.

use crate::domain::error::FolioError;
use crate::domain::portfolio::Portfolio;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// A CSV row that was not turned into a holding.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRow {
    pub line: usize,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioImport {
    pub portfolio: Portfolio,
    pub skipped: Vec<SkippedRow>,
}

fn format_error(file: &str, reason: impl Into<String>) -> FolioError {
    FolioError::PortfolioFormat {
        file: file.to_string(),
        reason: reason.into(),
    }
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Portfolio")
        .to_string()
}

/// Parses `Ticker,Weight` rows. Weights with a `%` suffix or above 1 are read
/// as percentages.
/// Blank tickers, negative or unparseable weights and repeated tickers are
/// reported in [`PortfolioImport::skipped`] rather than failing the import.
pub fn import_csv(content: &str, name: &str) -> Result<PortfolioImport, FolioError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());
    let headers = rdr
        .headers()
        .map_err(|e| format_error(name, e.to_string()))?
        .clone();
    let find = |col: &str| headers.iter().position(|h| h.trim().eq_ignore_ascii_case(col));
    let (Some(ticker_col), Some(weight_col)) = (find("ticker"), find("weight")) else {
        return Err(format_error(name, "expected Ticker and Weight columns"));
    };

    let mut portfolio = Portfolio::new(name);
    let mut skipped = Vec::new();

    for (i, result) in rdr.records().enumerate() {
        let line = i + 2;
        let mut skip = |reason: String| skipped.push(SkippedRow { line, reason });

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                skip(e.to_string());
                continue;
            }
        };

        let ticker = record.get(ticker_col).unwrap_or_default().trim().to_uppercase();
        if ticker.is_empty() {
            skip("missing ticker".to_string());
            continue;
        }
        let raw = record.get(weight_col).unwrap_or_default().trim();
        let weight = match raw.trim_end_matches('%').trim().parse::<f64>() {
            Ok(w) if w.is_finite() => w,
            _ => {
                skip(format!("unparseable weight '{}'", raw));
                continue;
            }
        };
        if weight < 0.0 {
            skip(format!("negative weight {} for {}", weight, ticker));
            continue;
        }
        if portfolio.weight(&ticker).is_some() {
            skip(format!("duplicate ticker {}", ticker));
            continue;
        }

        let weight = if raw.ends_with('%') || weight > 1.0 {
            weight / 100.0
        } else {
            weight
        };
        portfolio.add_ticker(&ticker, weight);
    }

    Ok(PortfolioImport { portfolio, skipped })
}

/// `Ticker,Weight` rows in holding order.
pub fn export_csv(portfolio: &Portfolio) -> Result<String, FolioError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    let io = |e: csv::Error| format_error(&portfolio.name, e.to_string());
    wtr.write_record(["Ticker", "Weight"]).map_err(io)?;
    for pos in portfolio.positions() {
        wtr.write_record([pos.ticker.as_str(), pos.weight.to_string().as_str()])
            .map_err(io)?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| format_error(&portfolio.name, e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| format_error(&portfolio.name, e.to_string()))
}

/// Loads a portfolio, choosing the format from the file extension (`.csv`,
/// anything else is JSON).
pub fn read_portfolio(path: &Path) -> Result<PortfolioImport, FolioError> {
    let file = path.display().to_string();
    let content = fs::read_to_string(path)?;

    let import = if is_csv(path) {
        import_csv(&content, &stem(path))?
    } else {
        let portfolio =
            Portfolio::from_json(&content).map_err(|e| format_error(&file, e.to_string()))?;
        PortfolioImport {
            portfolio,
            skipped: Vec::new(),
        }
    };

    for row in &import.skipped {
        warn!(file = %file, line = row.line, reason = %row.reason, "skipped portfolio row");
    }
    info!(
        file = %file,
        holdings = import.portfolio.len(),
        total_weight = import.portfolio.total_weight(),
        "loaded portfolio"
    );
    Ok(import)
}

pub fn write_portfolio(portfolio: &Portfolio, path: &Path) -> Result<(), FolioError> {
    let content = if is_csv(path) {
        export_csv(portfolio)?
    } else {
        portfolio
            .to_json()
            .map_err(|e| format_error(&path.display().to_string(), e.to_string()))?
    };
    fs::write(path, content)?;
    info!(file = %path.display(), holdings = portfolio.len(), "wrote portfolio");
    Ok(())
}
