//! Configuration validation.
//!
//! Validates every field an analysis run reads before any data is loaded,
//! and builds the typed window and settings from the validated values.

use crate::domain::alignment::{AnalysisWindow, DEFAULT_BENCHMARK};
use crate::domain::analysis::AnalysisSettings;
use crate::domain::error::FolioError;
use crate::domain::metrics::DEFAULT_PERCENTILES;
use crate::domain::portfolio::DEFAULT_WEIGHT_TOLERANCE;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const DEFAULT_POOL_SIZE: i64 = 4;

/// Where price and rate histories are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Csv,
    Sqlite,
}

pub fn validate_analysis_config(config: &dyn ConfigPort) -> Result<(), FolioError> {
    validate_data_source(config)?;
    analysis_window(config)?;
    analysis_settings(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> FolioError {
    FolioError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn required(config: &dyn ConfigPort, section: &str, key: &str) -> Result<String, FolioError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(FolioError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

pub fn data_source(config: &dyn ConfigPort) -> Result<DataSource, FolioError> {
    match config.get_string("data", "source") {
        None => Ok(DataSource::Csv),
        Some(s) => match s.trim().to_lowercase().as_str() {
            "" | "csv" => Ok(DataSource::Csv),
            "sqlite" => Ok(DataSource::Sqlite),
            other => Err(invalid(
                "data",
                "source",
                format!("unknown source '{}', expected csv or sqlite", other),
            )),
        },
    }
}

fn validate_data_source(config: &dyn ConfigPort) -> Result<(), FolioError> {
    match data_source(config)? {
        DataSource::Csv => {
            required(config, "data", "dir")?;
            required(config, "data", "risk_free_path")?;
        }
        DataSource::Sqlite => {
            required(config, "sqlite", "path")?;
            let pool_size = config.get_int("sqlite", "pool_size", DEFAULT_POOL_SIZE);
            if pool_size < 1 {
                return Err(invalid("sqlite", "pool_size", "pool_size must be at least 1"));
            }
        }
    }
    Ok(())
}

pub fn portfolio_path(config: &dyn ConfigPort) -> Result<String, FolioError> {
    required(config, "analysis", "portfolio")
}

pub fn parse_date(value: &str, field: &str) -> Result<NaiveDate, FolioError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        invalid(
            "analysis",
            field,
            format!("invalid {} format, expected YYYY-MM-DD", field),
        )
    })
}

pub fn analysis_window(config: &dyn ConfigPort) -> Result<AnalysisWindow, FolioError> {
    let start = parse_date(&required(config, "analysis", "start_date")?, "start_date")?;
    let end = parse_date(&required(config, "analysis", "end_date")?, "end_date")?;
    if start > end {
        return Err(invalid(
            "analysis",
            "start_date",
            "start_date must not be after end_date",
        ));
    }
    let benchmark = config
        .get_string("analysis", "benchmark")
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_BENCHMARK.to_string());
    AnalysisWindow::new(start, end, benchmark)
}

/// Parses a comma separated percentile list such as `5, 50, 95`.
pub fn parse_percentiles(value: &str) -> Result<Vec<f64>, FolioError> {
    value
        .split(',')
        .map(|token| {
            let token = token.trim();
            let p: f64 = token.parse().map_err(|_| {
                invalid("analysis", "percentiles", format!("'{}' is not a number", token))
            })?;
            if !(0.0..=100.0).contains(&p) {
                return Err(invalid(
                    "analysis",
                    "percentiles",
                    format!("{} is outside 0..=100", p),
                ));
            }
            Ok(p)
        })
        .collect()
}

pub fn analysis_settings(config: &dyn ConfigPort) -> Result<AnalysisSettings, FolioError> {
    let weight_tolerance =
        config.get_double("analysis", "weight_tolerance", DEFAULT_WEIGHT_TOLERANCE);
    if !(weight_tolerance > 0.0 && weight_tolerance < 1.0) {
        return Err(invalid(
            "analysis",
            "weight_tolerance",
            "weight_tolerance must be between 0 and 1",
        ));
    }

    let percentiles = match config.get_string("analysis", "percentiles") {
        Some(s) if !s.trim().is_empty() => parse_percentiles(&s)?,
        _ => DEFAULT_PERCENTILES.to_vec(),
    };

    Ok(AnalysisSettings {
        weight_tolerance,
        percentiles,
    })
}
