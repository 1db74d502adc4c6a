//! Backtest runner: preprocessing, row-by-row replay, consolidation.
//!
//! The replay is a strictly sequential fold: week/month trackers, deviation
//! history and ledger state all carry across rows, so no row is skipped,
//! revisited or processed out of order.

use super::curve::{CurveFit, Degree};
use super::decision::{Cell, DecisionTable};
use super::error::PairtraderError;
use super::ledger::{Ledger, TradeRecord};
use super::market::{PairRow, validate_row_order};
use super::metrics::{Summary, consolidate};
use super::signal::{Anchor, SignalEngine, SizingPolicy};

#[derive(Debug, Clone)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub tax_rate: f64,
    pub transaction_fee: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 1_000_000.0,
            tax_rate: 0.001,
            transaction_fee: 0.001,
        }
    }
}

/// Everything that defines one pair's strategy: the fitted-curve degree, the
/// over/under threshold, the decision table and the sizing policy.
#[derive(Debug, Clone)]
pub struct PairStrategy {
    pub anchor: Anchor,
    pub degree: Degree,
    pub multiplier: f64,
    pub table: DecisionTable,
    pub sizing: SizingPolicy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub records: Vec<TradeRecord>,
    pub returns: Vec<Option<f64>>,
    pub accum_returns: Vec<f64>,
    pub summary: Summary,
}

impl BacktestResult {
    /// The latest row's record, i.e. the live-mode recommendation.
    pub fn last_record(&self) -> Option<&TradeRecord> {
        self.records.last()
    }
}

#[derive(Debug, Clone)]
pub struct Backtest {
    config: BacktestConfig,
    strategy: PairStrategy,
}

impl Backtest {
    pub fn new(config: BacktestConfig, strategy: PairStrategy) -> Self {
        Backtest { config, strategy }
    }

    /// Fit the curve on historical paired returns, replay `rows`, and
    /// consolidate. `fit_samples` are (x, y) periodic returns at the
    /// strategy's anchor frequency.
    pub fn run(
        &self,
        fit_samples: &[(f64, f64)],
        rows: &[PairRow],
    ) -> Result<BacktestResult, PairtraderError> {
        validate_row_order(rows)?;

        let (x, y): (Vec<f64>, Vec<f64>) = fit_samples.iter().copied().unzip();
        let curve = CurveFit::fit(&x, &y, self.strategy.degree)?;

        self.replay(curve, rows)
    }

    /// Replay with an already-fitted curve.
    pub fn replay(
        &self,
        curve: CurveFit,
        rows: &[PairRow],
    ) -> Result<BacktestResult, PairtraderError> {
        let mut engine = SignalEngine::new(
            curve,
            self.strategy.table.clone(),
            self.strategy.anchor,
            self.strategy.multiplier,
            self.strategy.sizing,
        );
        let mut ledger = Ledger::new(
            self.config.initial_capital,
            self.config.tax_rate,
            self.config.transaction_fee,
        );

        for row in rows {
            let order = engine.decide(row)?;
            match order.cell {
                Cell::BuyFull | Cell::BuySized => {
                    ledger.buy(row.date, row.close_y, order.fraction)?;
                }
                Cell::Sell => {
                    ledger.sell(row.date, row.close_y, order.fraction)?;
                }
                Cell::Hold => {
                    ledger.hold(row.date, row.close_y);
                }
            }
        }

        let records = ledger.into_records();
        let consolidated = consolidate(&records, self.config.initial_capital)?;

        Ok(BacktestResult {
            records,
            returns: consolidated.returns,
            accum_returns: consolidated.accum_returns,
            summary: consolidated.summary,
        })
    }
}
