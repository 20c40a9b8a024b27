//! Configuration validation.
//!
//! Validates every key a command reads before any evaluation runs. The typed builders in
//! [`crate::domain::config`] fall back to defaults on unparseable numbers, so the raw
//! strings are checked here first.

use crate::domain::config::{build_backtest_config, build_trend_config, get_date};
use crate::domain::error::TrendError;
use crate::domain::universe::parse_symbols;
use crate::ports::config_port::ConfigPort;

const INTEGER_KEYS: &[(&str, &str)] = &[
    ("indicators", "fast"),
    ("indicators", "slow"),
    ("indicators", "signal"),
    ("indicators", "mfi_period"),
    ("score", "macd_std_window"),
    ("score", "obv_slope_window"),
    ("decision", "max_adds"),
    ("decision", "min_hold_days"),
];

const DECIMAL_KEYS: &[(&str, &str)] = &[
    ("score", "weight_macd"),
    ("score", "weight_mfi"),
    ("score", "weight_obv"),
    ("decision", "max_weight"),
    ("decision", "cash_reserve"),
    ("decision", "profit_take_pct"),
    ("decision", "weight_step"),
];

pub fn validate_trend_config(config: &dyn ConfigPort) -> Result<(), TrendError> {
    for &(section, key) in INTEGER_KEYS {
        validate_integer(config, section, key)?;
    }
    for &(section, key) in DECIMAL_KEYS {
        validate_decimal(config, section, key)?;
    }
    build_trend_config(config)?.validate()
}

/// `[backtest]` keys needed to load data and run the daily loop.
pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), TrendError> {
    validate_data_dir(config)?;
    validate_integer(config, "backtest", "lookback_bars")?;
    validate_decimal(config, "backtest", "initial_capital")?;
    validate_symbols(config)?;
    get_date(config, "start_date")?;
    get_date(config, "end_date")?;
    let backtest = build_backtest_config(config)?;
    backtest.validate()?;
    backtest.check_lookback(&build_trend_config(config)?)
}

pub fn validate_data_dir(config: &dyn ConfigPort) -> Result<(), TrendError> {
    match config.get_string("backtest", "data_dir") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(TrendError::ConfigMissing {
            section: "backtest".to_string(),
            key: "data_dir".to_string(),
        }),
    }
}

fn validate_symbols(config: &dyn ConfigPort) -> Result<(), TrendError> {
    match config.get_string("backtest", "symbols") {
        Some(s) => parse_symbols(&s)
            .map(|_| ())
            .map_err(|e| TrendError::config_invalid("backtest", "symbols", e.to_string())),
        None => Ok(()),
    }
}

fn validate_integer(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), TrendError> {
    match config.get_string(section, key) {
        Some(raw) if raw.trim().parse::<i64>().is_err() => Err(TrendError::config_invalid(
            section,
            key,
            format!("expected an integer, got '{}'", raw.trim()),
        )),
        _ => Ok(()),
    }
}

fn validate_decimal(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), TrendError> {
    match config.get_string(section, key) {
        Some(raw) if raw.trim().parse::<f64>().is_err() => Err(TrendError::config_invalid(
            section,
            key,
            format!("expected a number, got '{}'", raw.trim()),
        )),
        _ => Ok(()),
    }
}
