//! Configuration validation.
//!
//! Every recognized key is checked before a run starts; the engine itself
//! never sees an unvalidated value. This replaces the original system's
//! keyword-argument injection with explicit range and enum checks.

use crate::domain::curve::Degree;
use crate::domain::decision::{parse_arm, parse_gate};
use crate::domain::error::PairtraderError;
use crate::domain::signal::Anchor;
use crate::ports::config_port::ConfigPort;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), PairtraderError> {
    validate_initial_capital(config)?;
    validate_rate(config, "tax_rate")?;
    validate_rate(config, "transaction_fee")?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), PairtraderError> {
    validate_pair(config)?;
    validate_anchor(config)?;
    validate_degree(config)?;
    validate_multiplier(config)?;
    validate_sizing_caps(config)?;
    validate_table_cells(config)?;
    validate_gates(config)?;
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), PairtraderError> {
    let warmup = config.get_int("data", "warmup_rows", 0);
    if warmup < 0 {
        return Err(PairtraderError::ConfigInvalid {
            section: "data".to_string(),
            key: "warmup_rows".to_string(),
            reason: "warmup_rows must be non-negative".to_string(),
        });
    }
    Ok(())
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), PairtraderError> {
    let value = config.get_double("backtest", "initial_capital", 0.0);
    if value <= 0.0 {
        return Err(PairtraderError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "initial_capital".to_string(),
            reason: "initial_capital must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_rate(config: &dyn ConfigPort, key: &str) -> Result<(), PairtraderError> {
    let value = config.get_double("backtest", key, 0.001);
    if !(0.0..1.0).contains(&value) {
        return Err(PairtraderError::ConfigInvalid {
            section: "backtest".to_string(),
            key: key.to_string(),
            reason: format!("{key} must be in [0, 1)"),
        });
    }
    Ok(())
}

/// Exactly two whitespace-separated symbols, reference asset first.
pub fn parse_pair(value: &str) -> Option<(String, String)> {
    let mut parts = value.split_whitespace();
    let x = parts.next()?;
    let y = parts.next()?;
    if parts.next().is_some() || x == y {
        return None;
    }
    Some((x.to_string(), y.to_string()))
}

fn validate_pair(config: &dyn ConfigPort) -> Result<(), PairtraderError> {
    let value = config.get_string("strategy", "pair").ok_or_else(|| {
        PairtraderError::ConfigMissing {
            section: "strategy".to_string(),
            key: "pair".to_string(),
        }
    })?;
    if parse_pair(&value).is_none() {
        return Err(PairtraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "pair".to_string(),
            reason: "pair must name exactly two distinct symbols".to_string(),
        });
    }
    Ok(())
}

fn validate_anchor(config: &dyn ConfigPort) -> Result<(), PairtraderError> {
    let value = config
        .get_string("strategy", "anchor")
        .unwrap_or_else(|| "weekly".to_string());
    if Anchor::parse(&value).is_none() {
        return Err(PairtraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "anchor".to_string(),
            reason: "anchor must be weekly or monthly".to_string(),
        });
    }
    Ok(())
}

fn validate_degree(config: &dyn ConfigPort) -> Result<(), PairtraderError> {
    let value = config.get_int("strategy", "degree", 0);
    if Degree::from_int(value).is_none() {
        return Err(PairtraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "degree".to_string(),
            reason: "degree must be 1 or 2".to_string(),
        });
    }
    Ok(())
}

fn validate_multiplier(config: &dyn ConfigPort) -> Result<(), PairtraderError> {
    let value = config.get_double("strategy", "multiplier", f64::NAN);
    if !value.is_finite() || value <= 0.0 {
        return Err(PairtraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "multiplier".to_string(),
            reason: "multiplier must be a positive number".to_string(),
        });
    }
    Ok(())
}

fn validate_sizing_caps(config: &dyn ConfigPort) -> Result<(), PairtraderError> {
    let max_dev = config.get_double("strategy", "max_dev", f64::NAN);
    if !max_dev.is_finite() || max_dev <= 0.0 {
        return Err(PairtraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "max_dev".to_string(),
            reason: "max_dev must be a positive number".to_string(),
        });
    }
    let max_portion = config.get_double("strategy", "max_portion", f64::NAN);
    if !max_portion.is_finite() || max_portion <= 0.0 || max_portion > 1.0 {
        return Err(PairtraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "max_portion".to_string(),
            reason: "max_portion must be in (0, 1]".to_string(),
        });
    }
    Ok(())
}

fn validate_table_cells(config: &dyn ConfigPort) -> Result<(), PairtraderError> {
    for key in ["over_pos", "over_neg", "under_pos", "under_neg"] {
        if let Some(value) = config.get_string("strategy", key) {
            parse_arm(&value)?;
        }
    }
    Ok(())
}

fn validate_gates(config: &dyn ConfigPort) -> Result<(), PairtraderError> {
    for key in ["over_gate", "under_gate"] {
        if let Some(value) = config.get_string("strategy", key) {
            parse_gate(&value)?;
        }
    }
    Ok(())
}
