//! Report output port trait.

use crate::domain::backtest::BacktestReport;
use crate::domain::error::SigtraderError;
use std::path::Path;

pub trait ReportPort {
    fn write(&self, report: &BacktestReport, output_path: &Path) -> Result<(), SigtraderError>;
}
