//! JSON report writer.

use crate::domain::backtest::BacktestReport;
use crate::domain::error::SigtraderError;
use crate::ports::report_port::ReportPort;
use std::fs;
use std::path::Path;

pub struct JsonReportAdapter;

impl ReportPort for JsonReportAdapter {
    fn write(&self, report: &BacktestReport, output_path: &Path) -> Result<(), SigtraderError> {
        let json = serde_json::to_string_pretty(report).map_err(|e| SigtraderError::Data {
            reason: format!("failed to serialize report: {e}"),
        })?;
        fs::write(output_path, json)?;
        Ok(())
    }
}
