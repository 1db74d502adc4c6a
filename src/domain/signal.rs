//! Per-row decision logic for a correlated pair.
//!
//! Running returns are measured from a calendar anchor (the week's opening
//! prices or the month's first trading-day closes), compounded to the full
//! anchor horizon, pushed through the fair-value curve, and compounded back
//! to the partial horizon. The decision table then maps the over/under
//! comparison and the two return signs to an action.

use super::curve::CurveFit;
use super::decision::{Cell, DecisionTable};
use super::error::PairtraderError;
use super::market::{PairRow, days_in_month, iso_week, month_key};
use super::returns::resample;

pub const WEEK_HORIZON: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Weekly,
    Monthly,
}

impl Anchor {
    pub fn parse(name: &str) -> Option<Anchor> {
        match name {
            "weekly" => Some(Anchor::Weekly),
            "monthly" => Some(Anchor::Monthly),
            _ => None,
        }
    }
}

/// Fraction of deployable capital committed to a sized buy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizingPolicy {
    Fixed(f64),
    /// Committed fraction grows with the latest |deviation|, capped.
    DeviationScaled { max_dev: f64, max_portion: f64 },
}

impl Default for SizingPolicy {
    fn default() -> Self {
        SizingPolicy::Fixed(0.01)
    }
}

impl SizingPolicy {
    fn fraction(&self, deviations: &[f64]) -> f64 {
        match self {
            SizingPolicy::Fixed(f) => *f,
            SizingPolicy::DeviationScaled {
                max_dev,
                max_portion,
            } => deviations
                .last()
                .map(|d| (d.abs() / max_dev).min(*max_portion))
                .unwrap_or(0.0),
        }
    }
}

/// Week baseline, re-derived at the first row of each new ISO week.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeekState {
    pub week: u32,
    pub days_past: u32,
    pub open_x: f64,
    pub open_y: f64,
}

/// Month baseline: the first trading day's closes, with days_past counting
/// rows since that day (0 on the day itself).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthState {
    pub month: (i32, u32),
    pub days_past: u32,
    pub anchor_x: f64,
    pub anchor_y: f64,
}

/// The resolved decision for one row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Order {
    pub cell: Cell,
    pub fraction: f64,
}

#[derive(Debug, Clone)]
pub struct SignalEngine {
    curve: CurveFit,
    table: DecisionTable,
    anchor: Anchor,
    multiplier: f64,
    sizing: SizingPolicy,
    week: Option<WeekState>,
    month: Option<MonthState>,
    deviations: Vec<f64>,
}

impl SignalEngine {
    pub fn new(
        curve: CurveFit,
        table: DecisionTable,
        anchor: Anchor,
        multiplier: f64,
        sizing: SizingPolicy,
    ) -> Self {
        SignalEngine {
            curve,
            table,
            anchor,
            multiplier,
            sizing,
            week: None,
            month: None,
            deviations: Vec::new(),
        }
    }

    pub fn week_state(&self) -> Option<&WeekState> {
        self.week.as_ref()
    }

    pub fn month_state(&self) -> Option<&MonthState> {
        self.month.as_ref()
    }

    pub fn deviations(&self) -> &[f64] {
        &self.deviations
    }

    /// Advance the calendar state and decide this row. Rows must arrive in
    /// strictly ascending date order.
    pub fn decide(&mut self, row: &PairRow) -> Result<Order, PairtraderError> {
        let (return_x, return_y, horizon) = match self.anchor {
            Anchor::Weekly => self.advance_week(row)?,
            Anchor::Monthly => match self.advance_month(row)? {
                Some(measured) => measured,
                // first trading day of the month has no lookback
                None => {
                    return Ok(Order {
                        cell: Cell::Hold,
                        fraction: 0.0,
                    });
                }
            },
        };

        let period_return_x = resample(return_x, horizon, 1.0)?;
        let pred_period_y = self.curve.predict(period_return_x);
        let pred_return_y = resample(pred_period_y, 1.0, horizon)?;

        let deviation = pred_return_y - return_y;
        self.deviations.push(deviation);

        // `>=` resolves the boundary tie toward the over-valued branch
        let overvalued = return_y >= self.multiplier * pred_return_y;
        let cell = self.table.select(
            overvalued,
            return_y > 0.0,
            return_x > 0.0,
            &row.states,
        );

        let fraction = match cell {
            Cell::BuyFull | Cell::Sell => 1.0,
            Cell::BuySized => self.sizing.fraction(&self.deviations),
            Cell::Hold => 0.0,
        };

        Ok(Order { cell, fraction })
    }

    fn advance_week(&mut self, row: &PairRow) -> Result<(f64, f64, f64), PairtraderError> {
        let week = iso_week(row.date);
        let state = match self.week {
            Some(mut s) if s.week == week => {
                s.days_past += 1;
                s
            }
            _ => WeekState {
                week,
                days_past: 1,
                open_x: row.open_x,
                open_y: row.open_y,
            },
        };
        self.week = Some(state);

        let m = state.days_past as f64;
        let return_x = resample(row.close_x / state.open_x - 1.0, 1.0, m)?;
        let return_y = resample(row.close_y / state.open_y - 1.0, 1.0, m)?;
        Ok((return_x, return_y, WEEK_HORIZON))
    }

    fn advance_month(
        &mut self,
        row: &PairRow,
    ) -> Result<Option<(f64, f64, f64)>, PairtraderError> {
        let month = month_key(row.date);
        let state = match self.month {
            Some(mut s) if s.month == month => {
                s.days_past += 1;
                s
            }
            _ => MonthState {
                month,
                days_past: 0,
                anchor_x: row.close_x,
                anchor_y: row.close_y,
            },
        };
        self.month = Some(state);

        if state.days_past == 0 {
            return Ok(None);
        }

        let m = state.days_past as f64;
        let horizon = (days_in_month(row.date) - 1) as f64;
        let return_x = resample(row.close_x / state.anchor_x - 1.0, 1.0, m)?;
        let return_y = resample(row.close_y / state.anchor_y - 1.0, 1.0, m)?;
        Ok(Some((return_x, return_y, horizon)))
    }
}
