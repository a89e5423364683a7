//! SQLite time-series adapter.
//!
//! Schema: `timeseries(ticker, date, close)` and `risk_free(date, rate)`,
//! dates stored as ISO text so lexical order is date order.

use crate::adapters::csv_adapter::RISK_FREE_SERIES;
use crate::domain::error::FolioError;
use crate::domain::series::{Observation, PriceSeries, RateSeries, TimeSeries};
use crate::ports::config_port::ConfigPort;
use crate::ports::time_series_port::TimeSeriesPort;
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use tracing::debug;

use crate::domain::config_validation::DEFAULT_POOL_SIZE;

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn db_error(e: impl std::fmt::Display) -> FolioError {
    FolioError::Database {
        reason: e.to_string(),
    }
}

fn parse_date(value: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            value.len(),
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, FolioError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| FolioError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config
            .get_int("sqlite", "pool_size", DEFAULT_POOL_SIZE)
            .max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(db_error)?;

        debug!(path = %db_path, pool_size, "opened sqlite store");
        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, FolioError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(db_error)?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, FolioError> {
        self.pool.get().map_err(db_error)
    }

    pub fn initialize_schema(&self) -> Result<(), FolioError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS timeseries (
                    ticker TEXT NOT NULL,
                    date TEXT NOT NULL,
                    close REAL NOT NULL,
                    PRIMARY KEY (ticker, date)
                );
                CREATE INDEX IF NOT EXISTS idx_timeseries_date ON timeseries(date);
                CREATE TABLE IF NOT EXISTS risk_free (
                    date TEXT NOT NULL PRIMARY KEY,
                    rate REAL NOT NULL
                );",
            )
            .map_err(db_error)
    }

    /// Upserts every observation of `series` under `ticker`.
    pub fn insert_prices(&self, ticker: &str, series: &PriceSeries) -> Result<usize, FolioError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(db_error)?;
        for obs in series.points() {
            tx.execute(
                "INSERT OR REPLACE INTO timeseries (ticker, date, close) VALUES (?1, ?2, ?3)",
                params![ticker, obs.date.format("%Y-%m-%d").to_string(), obs.value],
            )
            .map_err(db_error)?;
        }
        tx.commit().map_err(db_error)?;
        Ok(series.len())
    }

    /// Upserts rates, stored as fractions.
    pub fn insert_rates(&self, series: &RateSeries) -> Result<usize, FolioError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(db_error)?;
        for obs in series.points() {
            tx.execute(
                "INSERT OR REPLACE INTO risk_free (date, rate) VALUES (?1, ?2)",
                params![obs.date.format("%Y-%m-%d").to_string(), obs.value],
            )
            .map_err(db_error)?;
        }
        tx.commit().map_err(db_error)?;
        Ok(series.len())
    }

    fn query_series(
        &self,
        name: &str,
        query: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<TimeSeries, FolioError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(query).map_err(db_error)?;
        let rows = stmt
            .query_map(params, |row| {
                let date_str: String = row.get(0)?;
                Ok(Observation::new(parse_date(&date_str)?, row.get(1)?))
            })
            .map_err(db_error)?;

        let mut points = Vec::new();
        for row in rows {
            points.push(row.map_err(db_error)?);
        }
        TimeSeries::new(name, points)
    }
}

impl TimeSeriesPort for SqliteAdapter {
    fn fetch_prices(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, FolioError> {
        let start_str = start_date.format("%Y-%m-%d").to_string();
        let end_str = end_date.format("%Y-%m-%d").to_string();
        self.query_series(
            ticker,
            "SELECT date, close FROM timeseries
             WHERE ticker = ?1 AND date >= ?2 AND date <= ?3
             ORDER BY date ASC",
            params![ticker, start_str, end_str],
        )
    }

    fn fetch_risk_free(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<RateSeries, FolioError> {
        let start_str = start_date.format("%Y-%m-%d").to_string();
        let end_str = end_date.format("%Y-%m-%d").to_string();
        self.query_series(
            RISK_FREE_SERIES,
            "SELECT date, rate FROM risk_free
             WHERE date >= ?1 AND date <= ?2
             ORDER BY date ASC",
            params![start_str, end_str],
        )
    }

    fn list_tickers(&self) -> Result<Vec<String>, FolioError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT ticker FROM timeseries ORDER BY ticker")
            .map_err(db_error)?;
        let rows = stmt.query_map([], |row| row.get(0)).map_err(db_error)?;

        let mut tickers = Vec::new();
        for row in rows {
            tickers.push(row.map_err(db_error)?);
        }
        Ok(tickers)
    }

    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, FolioError> {
        let result: (Option<String>, Option<String>, i64) = self
            .conn()?
            .query_row(
                "SELECT MIN(date), MAX(date), COUNT(*) FROM timeseries WHERE ticker = ?1",
                params![ticker],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(db_error)?;

        match result {
            (Some(min_str), Some(max_str), count) if count > 0 => {
                let min = parse_date(&min_str).map_err(db_error)?;
                let max = parse_date(&max_str).map_err(db_error)?;
                Ok(Some((min, max, count as usize)))
            }
            _ => Ok(None),
        }
    }
}
