//! Report generation port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::TraderError;

/// Port for persisting backtest results.
pub trait ReportPort {
    fn write(&self, result: &BacktestResult, output_path: &str) -> Result<(), TraderError>;
}
