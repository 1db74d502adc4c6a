//! Portfolio ledger: cash/shares/fee state and trade execution.
//!
//! Exactly one of buy/sell/hold mutates the ledger per row; every call
//! appends one TradeRecord. Equity is recomputed on every call as
//! shares * close * LOT_SIZE + cash - fees(row).
//!
//! Fees are recorded and subtracted inside the per-row equity figure but are
//! NOT deducted from cash. That mirrors the reference accounting this engine
//! replicates; see DESIGN.md before changing it.

use chrono::NaiveDate;

use super::error::PairtraderError;
use super::market::LOT_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl Action {
    pub fn label(&self) -> &'static str {
        match self {
            Action::Buy => "BUY",
            Action::Sell => "SELL",
            Action::Hold => "HOLD",
        }
    }
}

/// Per-row annotation, append-only, aligned 1:1 with the input rows.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub date: NaiveDate,
    pub close: f64,
    pub action: Action,
    pub sizing: f64,
    pub filled: f64,
    pub fees: f64,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    pub cash: f64,
    pub shares: f64,
    pub fees_paid: f64,
    pub initial_capital: f64,
    tax_rate: f64,
    transaction_fee: f64,
    records: Vec<TradeRecord>,
}

impl Ledger {
    pub fn new(initial_capital: f64, tax_rate: f64, transaction_fee: f64) -> Self {
        Ledger {
            cash: initial_capital,
            shares: 0.0,
            fees_paid: 0.0,
            initial_capital,
            tax_rate,
            transaction_fee,
            records: Vec::new(),
        }
    }

    pub fn records(&self) -> &[TradeRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<TradeRecord> {
        self.records
    }

    /// Commit `fraction` of available cash to lots of Y at `close`.
    ///
    /// Insufficient capital fills zero lots; that is a valid degenerate BUY
    /// and still produces a record.
    pub fn buy(
        &mut self,
        date: NaiveDate,
        close: f64,
        fraction: f64,
    ) -> Result<TradeRecord, PairtraderError> {
        if close <= 0.0 {
            return Err(PairtraderError::InvalidPrice { price: close, date });
        }

        let filled = (fraction * self.cash / (close * LOT_SIZE)).floor();
        let value = filled * close * LOT_SIZE;
        let fee = self.transaction_fee * value;

        self.shares += filled;
        self.cash -= value;
        self.fees_paid += fee;

        Ok(self.record(date, close, Action::Buy, fraction, filled, fee))
    }

    /// Sell `fraction` of held shares at `close`. Holding nothing fills zero
    /// and records a degenerate SELL.
    pub fn sell(
        &mut self,
        date: NaiveDate,
        close: f64,
        fraction: f64,
    ) -> Result<TradeRecord, PairtraderError> {
        if close <= 0.0 {
            return Err(PairtraderError::InvalidPrice { price: close, date });
        }

        let filled = (fraction * self.shares).floor();
        let value = filled * close * LOT_SIZE;
        let fee = (self.tax_rate + self.transaction_fee) * value;

        self.cash += value;
        self.shares -= filled;
        self.fees_paid += fee;

        Ok(self.record(date, close, Action::Sell, fraction, filled, fee))
    }

    pub fn hold(&mut self, date: NaiveDate, close: f64) -> TradeRecord {
        self.record(date, close, Action::Hold, 0.0, 0.0, 0.0)
    }

    /// shares * close * LOT_SIZE + cash - row_fees.
    pub fn equity(&self, close: f64, row_fees: f64) -> f64 {
        self.shares * close * LOT_SIZE + self.cash - row_fees
    }

    fn record(
        &mut self,
        date: NaiveDate,
        close: f64,
        action: Action,
        sizing: f64,
        filled: f64,
        fees: f64,
    ) -> TradeRecord {
        let rec = TradeRecord {
            date,
            close,
            action,
            sizing,
            filled,
            fees,
            equity: self.equity(close, fees),
        };
        self.records.push(rec.clone());
        rec
    }
}
