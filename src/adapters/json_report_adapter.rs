//! JSON report and chart-series CSV output.

use std::fs;
use std::path::Path;

use crate::domain::analysis::MetricsResult;
use crate::domain::error::FolioError;
use crate::ports::report_port::ReportPort;
use tracing::info;

/// Writes the full [`MetricsResult`] as pretty-printed JSON. Undefined
/// ratios appear as `null`.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonReportAdapter;

impl JsonReportAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, result: &MetricsResult) -> Result<String, FolioError> {
        serde_json::to_string_pretty(result).map_err(|e| {
            FolioError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })
    }
}

impl ReportPort for JsonReportAdapter {
    fn write(&self, result: &MetricsResult, output_path: &str) -> Result<(), FolioError> {
        let content = self.render(result)?;
        if let Some(parent) = Path::new(output_path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(output_path, content)?;
        info!(path = output_path, "wrote report");
        Ok(())
    }
}

/// `date,portfolio_equity,benchmark_equity,drawdown`, one row per common date.
pub fn series_csv(result: &MetricsResult) -> Result<String, FolioError> {
    let csv_err = |e: csv::Error| FolioError::Io(std::io::Error::other(e));
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(["date", "portfolio_equity", "benchmark_equity", "drawdown"])
        .map_err(csv_err)?;

    let rows = result
        .portfolio_equity
        .points()
        .iter()
        .zip(result.benchmark_equity.points())
        .zip(result.drawdown.points());
    for ((equity, bench), dd) in rows {
        wtr.write_record([
            equity.date.format("%Y-%m-%d").to_string(),
            equity.value.to_string(),
            bench.value.to_string(),
            dd.value.to_string(),
        ])
        .map_err(csv_err)?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| FolioError::Io(std::io::Error::other(e.to_string())))?;
    String::from_utf8(bytes)
        .map_err(|e| FolioError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

pub fn write_series_csv(result: &MetricsResult, output_path: &Path) -> Result<(), FolioError> {
    fs::write(output_path, series_csv(result)?)?;
    info!(path = %output_path.display(), rows = result.portfolio_equity.len(), "wrote series");
    Ok(())
}
