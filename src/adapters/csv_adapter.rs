//! CSV file data adapter.
//!
//! Daily prices live in one file per symbol, `{SYM}_daily.csv` with columns
//! `date,open,close`. Regime states for the target asset are optional, in
//! `{SYM}_states.csv` with columns `date,state_3,state_5,state_20,state_200`
//! (blank cells are unknown). The pair table is the inner join of the two
//! daily files on date, with a configurable number of initial rows dropped
//! (newly listed symbols trade erratically for a long stretch after listing).

use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use crate::domain::error::PairtraderError;
use crate::domain::market::{LiveQuote, PairRow, PairSymbols, RegimeStates, month_key};
use crate::domain::signal::Anchor;
use crate::ports::data_port::DataPort;

pub struct CsvAdapter {
    base_path: PathBuf,
    warmup_rows: usize,
}

struct DailyBar {
    open: f64,
    close: f64,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf, warmup_rows: usize) -> Self {
        Self {
            base_path,
            warmup_rows,
        }
    }

    fn daily_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}_daily.csv", symbol))
    }

    fn states_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}_states.csv", symbol))
    }

    fn read_daily(&self, symbol: &str) -> Result<BTreeMap<NaiveDate, DailyBar>, PairtraderError> {
        let path = self.daily_path(symbol);
        let content =
            fs::read_to_string(&path).map_err(|e| PairtraderError::MissingExternalData {
                reason: format!("failed to read {}: {}", path.display(), e),
            })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = BTreeMap::new();

        for result in rdr.records() {
            let record = result.map_err(|e| PairtraderError::MissingExternalData {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;

            let date = parse_date(record.get(0), &path)?;
            let open = parse_price(record.get(1), "open", &path)?;
            let close = parse_price(record.get(2), "close", &path)?;
            bars.insert(date, DailyBar { open, close });
        }

        Ok(bars)
    }

    fn read_states(
        &self,
        symbol: &str,
    ) -> Result<BTreeMap<NaiveDate, RegimeStates>, PairtraderError> {
        let path = self.states_path(symbol);
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            // states are optional; absence means every flag is unknown
            Err(_) => return Ok(BTreeMap::new()),
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut states = BTreeMap::new();

        for result in rdr.records() {
            let record = result.map_err(|e| PairtraderError::MissingExternalData {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;

            let date = parse_date(record.get(0), &path)?;
            states.insert(
                date,
                RegimeStates {
                    state_3: parse_state(record.get(1)),
                    state_5: parse_state(record.get(2)),
                    state_20: parse_state(record.get(3)),
                    state_200: parse_state(record.get(4)),
                },
            );
        }

        Ok(states)
    }

    fn joined_rows(&self, pair: &PairSymbols) -> Result<Vec<PairRow>, PairtraderError> {
        let x_bars = self.read_daily(&pair.x)?;
        let y_bars = self.read_daily(&pair.y)?;
        let states = self.read_states(&pair.y)?;

        let rows: Vec<PairRow> = x_bars
            .iter()
            .filter_map(|(date, x)| {
                y_bars.get(date).map(|y| PairRow {
                    date: *date,
                    open_x: x.open,
                    close_x: x.close,
                    open_y: y.open,
                    close_y: y.close,
                    states: states.get(date).copied().unwrap_or_default(),
                })
            })
            .collect();

        Ok(rows)
    }
}

fn parse_date(field: Option<&str>, path: &PathBuf) -> Result<NaiveDate, PairtraderError> {
    let value = field.ok_or_else(|| PairtraderError::MissingExternalData {
        reason: format!("missing date column in {}", path.display()),
    })?;
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| {
        PairtraderError::MissingExternalData {
            reason: format!("invalid date `{}` in {}: {}", value, path.display(), e),
        }
    })
}

fn parse_price(
    field: Option<&str>,
    column: &str,
    path: &PathBuf,
) -> Result<f64, PairtraderError> {
    field
        .ok_or_else(|| PairtraderError::MissingExternalData {
            reason: format!("missing {} column in {}", column, path.display()),
        })?
        .parse()
        .map_err(|e| PairtraderError::MissingExternalData {
            reason: format!("invalid {} value in {}: {}", column, path.display(), e),
        })
}

fn parse_state(field: Option<&str>) -> Option<u8> {
    match field.map(str::trim) {
        Some("0") => Some(0),
        Some("1") => Some(1),
        _ => None,
    }
}

/// (iso year, iso week) for weekly grouping, (year, month) for monthly.
fn period_key(date: NaiveDate, anchor: Anchor) -> (i32, u32) {
    match anchor {
        Anchor::Weekly => (date.iso_week().year(), date.iso_week().week()),
        Anchor::Monthly => month_key(date),
    }
}

impl DataPort for CsvAdapter {
    fn fetch_pair_rows(&self, pair: &PairSymbols) -> Result<Vec<PairRow>, PairtraderError> {
        let rows = self.joined_rows(pair)?;
        Ok(rows.into_iter().skip(self.warmup_rows).collect())
    }

    /// Periodic paired returns from the joined history: the last joint close
    /// of each period, `r = c / c_prev - 1` per symbol.
    fn fetch_fit_samples(
        &self,
        pair: &PairSymbols,
        anchor: Anchor,
    ) -> Result<Vec<(f64, f64)>, PairtraderError> {
        let rows = self.joined_rows(pair)?;

        let mut period_closes: Vec<(f64, f64)> = Vec::new();
        let mut current: Option<(i32, u32)> = None;
        for row in &rows {
            let key = period_key(row.date, anchor);
            if current == Some(key) {
                if let Some(last) = period_closes.last_mut() {
                    *last = (row.close_x, row.close_y);
                }
            } else {
                current = Some(key);
                period_closes.push((row.close_x, row.close_y));
            }
        }

        let samples = period_closes
            .windows(2)
            .map(|w| (w[1].0 / w[0].0 - 1.0, w[1].1 / w[0].1 - 1.0))
            .collect();
        Ok(samples)
    }

    fn fetch_live_quote(&self, _symbol: &str) -> Result<LiveQuote, PairtraderError> {
        Err(PairtraderError::MissingExternalData {
            reason: "no live price source configured for CSV data".to_string(),
        })
    }
}
