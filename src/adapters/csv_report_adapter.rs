//! CSV results adapter: writes the per-row results table.

use std::fs;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::PairtraderError;
use crate::ports::report_port::ReportPort;

pub struct CsvReportAdapter;

impl ReportPort for CsvReportAdapter {
    fn write(&self, result: &BacktestResult, output_path: &str) -> Result<(), PairtraderError> {
        let mut wtr = csv::Writer::from_writer(Vec::new());

        wtr.write_record([
            "date",
            "close",
            "action",
            "sizing",
            "filled",
            "fees",
            "equity",
            "returns",
            "accum_returns",
        ])
        .map_err(csv_io_error)?;

        for (i, rec) in result.records.iter().enumerate() {
            let returns = result.returns[i]
                .map(|r| format!("{:.6}", r))
                .unwrap_or_default();
            wtr.write_record([
                rec.date.format("%Y-%m-%d").to_string(),
                format!("{}", rec.close),
                rec.action.label().to_string(),
                format!("{:.4}", rec.sizing),
                format!("{}", rec.filled),
                format!("{:.2}", rec.fees),
                format!("{:.2}", rec.equity),
                returns,
                format!("{:.6}", result.accum_returns[i]),
            ])
            .map_err(csv_io_error)?;
        }

        let data = wtr.into_inner().map_err(|e| {
            PairtraderError::Io(std::io::Error::other(e.to_string()))
        })?;
        fs::write(output_path, data)?;
        Ok(())
    }
}

fn csv_io_error(e: csv::Error) -> PairtraderError {
    PairtraderError::Io(std::io::Error::other(e.to_string()))
}
