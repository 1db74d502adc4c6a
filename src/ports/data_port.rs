//! Price data access port trait.
//!
//! The core requires rows pre-sorted ascending by date, no duplicates, with
//! regime states already joined. Fit samples are paired periodic returns at
//! the strategy's anchor frequency. A data source that cannot serve live
//! quotes fails with MissingExternalData; the core never substitutes a
//! stale or synthetic price.

use crate::domain::error::PairtraderError;
use crate::domain::market::{LiveQuote, PairRow, PairSymbols};
use crate::domain::signal::Anchor;

pub trait DataPort {
    fn fetch_pair_rows(&self, pair: &PairSymbols) -> Result<Vec<PairRow>, PairtraderError>;

    fn fetch_fit_samples(
        &self,
        pair: &PairSymbols,
        anchor: Anchor,
    ) -> Result<Vec<(f64, f64)>, PairtraderError>;

    fn fetch_live_quote(&self, symbol: &str) -> Result<LiveQuote, PairtraderError>;
}
