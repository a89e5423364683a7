//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for folioscope.
#[derive(Debug, thiserror::Error)]
pub enum FolioError {
    #[error("insufficient data for {context}: have {have} observations, need {need}")]
    InsufficientData {
        context: String,
        have: usize,
        need: usize,
    },

    #[error("invalid value {value} for {series} on {date}")]
    DataIntegrity {
        series: String,
        date: NaiveDate,
        value: f64,
    },

    #[error("weights do not match return series (no weight for [{}], no returns for [{}])",
        .missing_weights.join(", "), .missing_returns.join(", "))]
    WeightMismatch {
        missing_weights: Vec<String>,
        missing_returns: Vec<String>,
    },

    #[error("portfolio weights sum to {total:.6}, expected 1.0 within {tolerance}")]
    WeightSum { total: f64, tolerance: f64 },

    #[error("invalid weight {weight} for {ticker}")]
    InvalidWeight { ticker: String, weight: f64 },

    #[error("duplicate ticker: {0}")]
    DuplicateTicker(String),

    #[error("portfolio has no holdings")]
    EmptyPortfolio,

    #[error("ticker {0} is not in the portfolio")]
    UnknownTicker(String),

    #[error("{series} lacks consistent coverage between {start} and {end}")]
    Alignment {
        series: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("no price series supplied for {0}")]
    MissingSeries(String),

    #[error("invalid analysis window: {start} is after {end}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },

    #[error("series {series} is not strictly increasing at {date}")]
    UnorderedSeries { series: String, date: NaiveDate },

    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("portfolio file {file}: {reason}")]
    PortfolioFormat { file: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&FolioError> for std::process::ExitCode {
    fn from(err: &FolioError) -> Self {
        let code: u8 = match err {
            FolioError::Io(_) => 1,
            FolioError::ConfigParse { .. }
            | FolioError::ConfigMissing { .. }
            | FolioError::ConfigInvalid { .. } => 2,
            FolioError::Database { .. } => 3,
            FolioError::WeightMismatch { .. }
            | FolioError::WeightSum { .. }
            | FolioError::InvalidWeight { .. }
            | FolioError::DuplicateTicker(_)
            | FolioError::EmptyPortfolio
            | FolioError::UnknownTicker(_)
            | FolioError::PortfolioFormat { .. } => 4,
            FolioError::InsufficientData { .. }
            | FolioError::DataIntegrity { .. }
            | FolioError::Alignment { .. }
            | FolioError::MissingSeries(_)
            | FolioError::InvalidWindow { .. }
            | FolioError::UnorderedSeries { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
