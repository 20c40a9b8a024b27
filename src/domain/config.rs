//! Typed configuration for the scoring and decision stack.

use chrono::NaiveDate;

use crate::domain::backtest::{BacktestConfig, DEFAULT_LOOKBACK_BARS};
use crate::domain::decision::{DecisionParams, Policy};
use crate::domain::error::TrendError;
use crate::domain::pipeline::IndicatorParams;
use crate::domain::score::{ScoreParams, ScoreWeights};
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_INITIAL_CAPITAL: f64 = 100_000.0;

/// Everything the pipeline, aggregator and engine need, passed explicitly at construction.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrendConfig {
    pub indicators: IndicatorParams,
    pub score: ScoreParams,
    pub decision: DecisionParams,
}

impl TrendConfig {
    pub fn validate(&self) -> Result<(), TrendError> {
        validate_indicators(&self.indicators)?;
        self.score.validate()?;
        self.decision.validate()?;
        Ok(())
    }

    /// Fewest bars a series needs before its latest bar can be scored.
    pub fn min_scoring_bars(&self) -> usize {
        let macd = self.indicators.macd_warmup() + self.score.macd_std_window - 1;
        macd.max(self.score.obv_slope_window + 1)
            .max(self.indicators.mfi_period)
    }
}

fn validate_indicators(p: &IndicatorParams) -> Result<(), TrendError> {
    for (key, value) in [
        ("fast", p.fast),
        ("slow", p.slow),
        ("signal", p.signal),
        ("mfi_period", p.mfi_period),
    ] {
        if value == 0 {
            return Err(TrendError::config_invalid(
                "indicators",
                key,
                format!("{key} must be positive"),
            ));
        }
    }
    if p.fast >= p.slow {
        return Err(TrendError::config_invalid(
            "indicators",
            "fast",
            "fast must be less than slow",
        ));
    }
    Ok(())
}

/// Assemble a [`TrendConfig`] from `[indicators]`, `[score]` and `[decision]`.
///
/// Missing keys take their defaults. The result is not range-checked; call
/// [`TrendConfig::validate`].
pub fn build_trend_config(config: &dyn ConfigPort) -> Result<TrendConfig, TrendError> {
    let d = TrendConfig::default();

    let policy = match config.get_string("decision", "policy") {
        Some(raw) => raw
            .parse::<Policy>()
            .map_err(|reason| TrendError::config_invalid("decision", "policy", reason))?,
        None => d.decision.policy,
    };

    Ok(TrendConfig {
        indicators: IndicatorParams {
            fast: get_count(config, "indicators", "fast", d.indicators.fast)?,
            slow: get_count(config, "indicators", "slow", d.indicators.slow)?,
            signal: get_count(config, "indicators", "signal", d.indicators.signal)?,
            mfi_period: get_count(config, "indicators", "mfi_period", d.indicators.mfi_period)?,
        },
        score: ScoreParams {
            weights: ScoreWeights {
                macd: config.get_double("score", "weight_macd", d.score.weights.macd),
                mfi: config.get_double("score", "weight_mfi", d.score.weights.mfi),
                obv: config.get_double("score", "weight_obv", d.score.weights.obv),
            },
            macd_std_window: get_count(config, "score", "macd_std_window", d.score.macd_std_window)?,
            obv_slope_window: get_count(
                config,
                "score",
                "obv_slope_window",
                d.score.obv_slope_window,
            )?,
        },
        decision: DecisionParams {
            policy,
            max_weight: config.get_double("decision", "max_weight", d.decision.max_weight),
            cash_reserve: config.get_double("decision", "cash_reserve", d.decision.cash_reserve),
            max_adds: get_u32(config, "decision", "max_adds", d.decision.max_adds)?,
            profit_take_pct: config.get_double(
                "decision",
                "profit_take_pct",
                d.decision.profit_take_pct,
            ),
            min_hold_days: get_u32(config, "decision", "min_hold_days", d.decision.min_hold_days)?,
            weight_step: config.get_double("decision", "weight_step", d.decision.weight_step),
        },
    })
}

/// Assemble a [`BacktestConfig`] from `[backtest]`.
///
/// Without `start_date` / `end_date` the loop covers all loaded data.
pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, TrendError> {
    Ok(BacktestConfig {
        start_date: get_date(config, "start_date")?.unwrap_or(NaiveDate::MIN),
        end_date: get_date(config, "end_date")?.unwrap_or(NaiveDate::MAX),
        initial_capital: config.get_double("backtest", "initial_capital", DEFAULT_INITIAL_CAPITAL),
        lookback_bars: get_count(config, "backtest", "lookback_bars", DEFAULT_LOOKBACK_BARS)?,
    })
}

pub(crate) fn get_date(config: &dyn ConfigPort, key: &str) -> Result<Option<NaiveDate>, TrendError> {
    config
        .get_string("backtest", key)
        .map(|s| {
            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
                TrendError::config_invalid(
                    "backtest",
                    key,
                    "invalid date format (expected YYYY-MM-DD)",
                )
            })
        })
        .transpose()
}

fn get_count(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, TrendError> {
    let value = config.get_int(section, key, default as i64);
    usize::try_from(value)
        .map_err(|_| TrendError::config_invalid(section, key, format!("{key} must not be negative")))
}

fn get_u32(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: u32,
) -> Result<u32, TrendError> {
    let value = config.get_int(section, key, i64::from(default));
    u32::try_from(value)
        .map_err(|_| TrendError::config_invalid(section, key, format!("{key} must not be negative")))
}
