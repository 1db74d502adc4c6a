//! Data-driven decision tables.
//!
//! One table per traded pair replaces a strategy subclass: two quadrants
//! (over-valued / under-valued), each with an optional regime gate and two
//! arms keyed by the sign of the target's running return, each arm mapping
//! the sign of the reference asset's return to exactly one cell.
//!
//! Tables are written in config as two-token arms ("buy hold") and gate
//! disjunctions ("state_3=0 | state_5=0 | state_200=1").

use super::error::TableParseError;
use super::market::{RegimeLag, RegimeStates};

/// A leaf of the decision table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    /// Buy with all available cash.
    BuyFull,
    /// Buy sized by the strategy's sizing policy.
    BuySized,
    /// Sell the whole holding.
    Sell,
    Hold,
}

/// One `state_<lag>=<0|1>` term of a gate disjunction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateTerm {
    pub lag: RegimeLag,
    pub expected: u8,
}

/// Disjunction over regime state flags. An unknown flag never satisfies a
/// term, so a row without states falls through to the ungated arm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegimeGate {
    terms: Vec<GateTerm>,
}

impl RegimeGate {
    pub fn new(terms: Vec<GateTerm>) -> Self {
        RegimeGate { terms }
    }

    pub fn is_open(&self, states: &RegimeStates) -> bool {
        self.terms
            .iter()
            .any(|t| states.get(t.lag) == Some(t.expected))
    }
}

/// Cells for the two signs of the reference asset's return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arm {
    pub x_pos: Cell,
    pub x_neg: Cell,
}

/// Half of a table: chosen by the over/under comparison, then refined by
/// (return_y > 0 AND gate) into one of two arms.
#[derive(Debug, Clone, PartialEq)]
pub struct Quadrant {
    pub gate: Option<RegimeGate>,
    pub when_pos: Arm,
    pub otherwise: Arm,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTable {
    pub over: Quadrant,
    pub under: Quadrant,
}

impl DecisionTable {
    /// The ungated reference table: hold into strength, sell joint weakness
    /// when over-valued; accumulate when under-valued.
    pub fn default_table() -> Self {
        DecisionTable {
            over: Quadrant {
                gate: None,
                when_pos: Arm {
                    x_pos: Cell::Hold,
                    x_neg: Cell::Hold,
                },
                otherwise: Arm {
                    x_pos: Cell::Hold,
                    x_neg: Cell::Sell,
                },
            },
            under: Quadrant {
                gate: None,
                when_pos: Arm {
                    x_pos: Cell::BuyFull,
                    x_neg: Cell::Hold,
                },
                otherwise: Arm {
                    x_pos: Cell::BuySized,
                    x_neg: Cell::BuySized,
                },
            },
        }
    }

    /// Resolve one row's cell. `overvalued` carries the `>=` tie-break:
    /// the caller computes it as `return_y >= multiplier * pred_return_y`.
    pub fn select(
        &self,
        overvalued: bool,
        y_positive: bool,
        x_positive: bool,
        states: &RegimeStates,
    ) -> Cell {
        let quadrant = if overvalued { &self.over } else { &self.under };
        let gated = y_positive
            && quadrant
                .gate
                .as_ref()
                .map(|g| g.is_open(states))
                .unwrap_or(true);
        let arm = if gated {
            &quadrant.when_pos
        } else {
            &quadrant.otherwise
        };
        if x_positive { arm.x_pos } else { arm.x_neg }
    }
}

fn tokens_with_pos(input: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut iter = input.char_indices().peekable();
    while let Some(&(i, c)) = iter.peek() {
        if c.is_whitespace() {
            iter.next();
            continue;
        }
        let start = i;
        let mut end = i + c.len_utf8();
        iter.next();
        while let Some(&(j, c2)) = iter.peek() {
            if c2.is_whitespace() {
                break;
            }
            end = j + c2.len_utf8();
            iter.next();
        }
        out.push((start, &input[start..end]));
    }
    out
}

fn parse_cell(token: &str, position: usize) -> Result<Cell, TableParseError> {
    match token {
        "buy" => Ok(Cell::BuyFull),
        "buy_sized" => Ok(Cell::BuySized),
        "sell" => Ok(Cell::Sell),
        "hold" => Ok(Cell::Hold),
        other => Err(TableParseError {
            message: format!(
                "unknown action `{other}` (expected buy, buy_sized, sell or hold)"
            ),
            position,
        }),
    }
}

/// Parse a two-token arm: the x>0 cell then the x<=0 cell.
pub fn parse_arm(input: &str) -> Result<Arm, TableParseError> {
    let tokens = tokens_with_pos(input);
    match tokens.as_slice() {
        [(p1, t1), (p2, t2)] => Ok(Arm {
            x_pos: parse_cell(t1, *p1)?,
            x_neg: parse_cell(t2, *p2)?,
        }),
        _ => Err(TableParseError {
            message: format!("expected exactly 2 actions, found {}", tokens.len()),
            position: tokens.get(2).map(|&(p, _)| p).unwrap_or(input.len()),
        }),
    }
}

/// Parse a gate disjunction: `state_<lag>=<0|1>` terms joined by `|`.
pub fn parse_gate(input: &str) -> Result<RegimeGate, TableParseError> {
    let mut terms = Vec::new();
    let mut offset = 0;
    for segment in input.split('|') {
        let trimmed = segment.trim();
        let position = offset + (segment.len() - segment.trim_start().len());
        if trimmed.is_empty() {
            return Err(TableParseError {
                message: "empty gate term".into(),
                position,
            });
        }
        terms.push(parse_gate_term(trimmed, position)?);
        offset += segment.len() + 1;
    }
    Ok(RegimeGate::new(terms))
}

fn parse_gate_term(term: &str, position: usize) -> Result<GateTerm, TableParseError> {
    let Some((name, value)) = term.split_once('=') else {
        return Err(TableParseError {
            message: format!("gate term `{term}` is missing `=`"),
            position,
        });
    };
    let Some(lag) = RegimeLag::parse(name.trim()) else {
        return Err(TableParseError {
            message: format!(
                "unknown state column `{}` (expected state_3, state_5, state_20 or state_200)",
                name.trim()
            ),
            position,
        });
    };
    let expected = match value.trim() {
        "0" => 0,
        "1" => 1,
        other => {
            return Err(TableParseError {
                message: format!("state value `{other}` must be 0 or 1"),
                position: position + name.len() + 1,
            });
        }
    };
    Ok(GateTerm { lag, expected })
}
