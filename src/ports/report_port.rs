//! Report output port trait.

use crate::domain::analysis::MetricsResult;
use crate::domain::error::FolioError;

/// Port for writing analysis results.
pub trait ReportPort {
    fn write(&self, result: &MetricsResult, output_path: &str) -> Result<(), FolioError>;
}
