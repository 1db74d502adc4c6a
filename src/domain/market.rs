//! Joined pair price rows and calendar derivations.

use chrono::{Datelike, NaiveDate};

use super::error::PairtraderError;

/// Board lot multiplier: prices are quoted per share, trades settle per
/// thousand-share lot.
pub const LOT_SIZE: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairSymbols {
    pub x: String,
    pub y: String,
}

impl PairSymbols {
    pub fn new(x: &str, y: &str) -> Self {
        PairSymbols {
            x: x.to_string(),
            y: y.to_string(),
        }
    }

    /// "X_Y", used for data file and results naming.
    pub fn label(&self) -> String {
        format!("{}_{}", self.x, self.y)
    }
}

/// Regime state flags from the external classifier, one per lag window.
/// Absent flags are unknown and never satisfy a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegimeStates {
    pub state_3: Option<u8>,
    pub state_5: Option<u8>,
    pub state_20: Option<u8>,
    pub state_200: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegimeLag {
    Days3,
    Days5,
    Days20,
    Days200,
}

impl RegimeLag {
    pub fn parse(name: &str) -> Option<RegimeLag> {
        match name {
            "state_3" => Some(RegimeLag::Days3),
            "state_5" => Some(RegimeLag::Days5),
            "state_20" => Some(RegimeLag::Days20),
            "state_200" => Some(RegimeLag::Days200),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RegimeLag::Days3 => "state_3",
            RegimeLag::Days5 => "state_5",
            RegimeLag::Days20 => "state_20",
            RegimeLag::Days200 => "state_200",
        }
    }
}

impl RegimeStates {
    pub fn get(&self, lag: RegimeLag) -> Option<u8> {
        match lag {
            RegimeLag::Days3 => self.state_3,
            RegimeLag::Days5 => self.state_5,
            RegimeLag::Days20 => self.state_20,
            RegimeLag::Days200 => self.state_200,
        }
    }
}

/// One trading day's joined observation for the pair. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct PairRow {
    pub date: NaiveDate,
    pub open_x: f64,
    pub close_x: f64,
    pub open_y: f64,
    pub close_y: f64,
    pub states: RegimeStates,
}

/// A single live observation appended in live mode.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveQuote {
    pub date: NaiveDate,
    pub price: f64,
}

/// ISO week number of a trading day. The week identity deliberately omits
/// the ISO year: consecutive rows only ever move forward one week at a time.
pub fn iso_week(date: NaiveDate) -> u32 {
    date.iso_week().week()
}

pub fn month_key(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

pub fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = month_key(date);
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    first_of_next
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(30)
}

/// The replay requires strictly ascending dates with no duplicates.
pub fn validate_row_order(rows: &[PairRow]) -> Result<(), PairtraderError> {
    for pair in rows.windows(2) {
        if pair[1].date <= pair[0].date {
            return Err(PairtraderError::UnsortedRows {
                date: pair[1].date,
            });
        }
    }
    Ok(())
}
