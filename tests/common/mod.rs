#![allow(dead_code)]

use chrono::NaiveDate;
use pairtrader::domain::backtest::{BacktestConfig, PairStrategy};
use pairtrader::domain::curve::Degree;
use pairtrader::domain::decision::DecisionTable;
use pairtrader::domain::error::PairtraderError;
pub use pairtrader::domain::market::{PairRow, PairSymbols, RegimeStates};
use pairtrader::domain::market::LiveQuote;
use pairtrader::domain::signal::{Anchor, SizingPolicy};
use pairtrader::ports::data_port::DataPort;
use std::collections::HashMap;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_row(d: NaiveDate, close_x: f64, close_y: f64) -> PairRow {
    PairRow {
        date: d,
        open_x: close_x,
        close_x,
        open_y: close_y,
        close_y,
        states: RegimeStates::default(),
    }
}

pub fn sample_config() -> BacktestConfig {
    BacktestConfig {
        initial_capital: 1_000_000.0,
        tax_rate: 0.001,
        transaction_fee: 0.001,
    }
}

pub fn weekly_strategy(multiplier: f64) -> PairStrategy {
    PairStrategy {
        anchor: Anchor::Weekly,
        degree: Degree::Linear,
        multiplier,
        table: DecisionTable::default_table(),
        sizing: SizingPolicy::DeviationScaled {
            max_dev: 0.1,
            max_portion: 0.1,
        },
    }
}

pub fn linear_fit_samples() -> Vec<(f64, f64)> {
    vec![(0.01, 0.02), (0.02, 0.04), (0.03, 0.06)]
}

pub struct MockDataPort {
    pub rows: Vec<PairRow>,
    pub fit_samples: Vec<(f64, f64)>,
    pub quotes: HashMap<String, LiveQuote>,
}

impl MockDataPort {
    pub fn new(rows: Vec<PairRow>, fit_samples: Vec<(f64, f64)>) -> Self {
        Self {
            rows,
            fit_samples,
            quotes: HashMap::new(),
        }
    }

    pub fn with_quote(mut self, symbol: &str, quote: LiveQuote) -> Self {
        self.quotes.insert(symbol.to_string(), quote);
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_pair_rows(&self, _pair: &PairSymbols) -> Result<Vec<PairRow>, PairtraderError> {
        Ok(self.rows.clone())
    }

    fn fetch_fit_samples(
        &self,
        _pair: &PairSymbols,
        _anchor: Anchor,
    ) -> Result<Vec<(f64, f64)>, PairtraderError> {
        Ok(self.fit_samples.clone())
    }

    fn fetch_live_quote(&self, symbol: &str) -> Result<LiveQuote, PairtraderError> {
        self.quotes
            .get(symbol)
            .cloned()
            .ok_or_else(|| PairtraderError::MissingExternalData {
                reason: format!("no live quote for {symbol}"),
            })
    }
}
