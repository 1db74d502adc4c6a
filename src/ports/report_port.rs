//! Results sink port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::PairtraderError;

/// Port for writing the per-row results table.
pub trait ReportPort {
    fn write(&self, result: &BacktestResult, output_path: &str) -> Result<(), PairtraderError>;
}
