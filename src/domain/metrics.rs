//! Run consolidation: per-row return series and summary statistics.

use super::error::PairtraderError;
use super::ledger::{Action, TradeRecord};
use super::returns::annualize;

/// Mean per-row return grouped by recorded action. An action that never
/// occurred (or only occurred on the first row) has no mean.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ActionValues {
    pub buy: Option<f64>,
    pub sell: Option<f64>,
    pub hold: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total_returns: f64,
    pub annualized_returns: f64,
    pub action_values: ActionValues,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Consolidated {
    /// equity[t] / equity[t-1] - 1; the first row has no predecessor.
    pub returns: Vec<Option<f64>>,
    /// equity[t] / initial_capital - 1.
    pub accum_returns: Vec<f64>,
    pub summary: Summary,
}

pub fn consolidate(
    records: &[TradeRecord],
    initial_capital: f64,
) -> Result<Consolidated, PairtraderError> {
    if records.is_empty() {
        return Ok(Consolidated {
            returns: Vec::new(),
            accum_returns: Vec::new(),
            summary: Summary {
                total_returns: 0.0,
                annualized_returns: 0.0,
                action_values: ActionValues::default(),
            },
        });
    }

    let mut returns: Vec<Option<f64>> = Vec::with_capacity(records.len());
    let mut accum_returns = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let daily = if i == 0 {
            None
        } else {
            let prev = records[i - 1].equity;
            Some(rec.equity / prev - 1.0)
        };
        returns.push(daily);
        accum_returns.push(rec.equity / initial_capital - 1.0);
    }

    let total_returns = *accum_returns.last().unwrap_or(&0.0);
    let annualized_returns = annualize(total_returns, records.len())?;
    let action_values = mean_by_action(records, &returns);

    Ok(Consolidated {
        returns,
        accum_returns,
        summary: Summary {
            total_returns,
            annualized_returns,
            action_values,
        },
    })
}

fn mean_by_action(records: &[TradeRecord], returns: &[Option<f64>]) -> ActionValues {
    let mut sums = [0.0f64; 3];
    let mut counts = [0usize; 3];
    for (rec, ret) in records.iter().zip(returns) {
        let Some(r) = *ret else { continue };
        let slot = match rec.action {
            Action::Buy => 0,
            Action::Sell => 1,
            Action::Hold => 2,
        };
        sums[slot] += r;
        counts[slot] += 1;
    }
    let mean = |slot: usize| {
        if counts[slot] > 0 {
            Some(sums[slot] / counts[slot] as f64)
        } else {
            None
        }
    };
    ActionValues {
        buy: mean(0),
        sell: mean(1),
        hold: mean(2),
    }
}
