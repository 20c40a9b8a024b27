//! Daily evaluation driver.
//!
//! Per timeline date:
//! 1. Mark the host at each symbol's latest close on or before the date
//! 2. Score every symbol with a bar that day on its trailing `lookback_bars` window
//! 3. Run one decision pass against the host
//! 4. Record equity

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::domain::config::TrendConfig;
use crate::domain::decision::{DecisionEngine, PassReport};
use crate::domain::error::TrendError;
use crate::domain::ohlcv::BarSeries;
use crate::domain::pipeline::IndicatorPipeline;
use crate::domain::portfolio::{EquityPoint, Fill, SimPortfolio};
use crate::domain::score::{Score, ScoreAggregator};
use crate::domain::timeline::clip_timeline;

pub const DEFAULT_LOOKBACK_BARS: usize = 60;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    /// Trailing bars handed to the pipeline on each evaluation date.
    pub lookback_bars: usize,
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), TrendError> {
        if self.start_date > self.end_date {
            return Err(TrendError::config_invalid(
                "backtest",
                "start_date",
                "start_date must not be after end_date",
            ));
        }
        if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
            return Err(TrendError::config_invalid(
                "backtest",
                "initial_capital",
                "initial_capital must be positive",
            ));
        }
        if self.lookback_bars == 0 {
            return Err(TrendError::config_invalid(
                "backtest",
                "lookback_bars",
                "lookback_bars must be positive",
            ));
        }
        Ok(())
    }

    /// Rejects a lookback too short for `trend` to ever produce a score.
    pub fn check_lookback(&self, trend: &TrendConfig) -> Result<(), TrendError> {
        let minimum = trend.min_scoring_bars();
        if self.lookback_bars < minimum {
            return Err(TrendError::config_invalid(
                "backtest",
                "lookback_bars",
                format!("lookback_bars must be at least {minimum} for the configured indicators"),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub passes: Vec<PassReport>,
    pub equity_curve: Vec<EquityPoint>,
    pub fills: Vec<Fill>,
    /// Symbols still held after the last date.
    pub open_positions: usize,
    pub initial_capital: f64,
    pub final_equity: f64,
}

impl BacktestResult {
    pub fn total_return(&self) -> f64 {
        if self.initial_capital > 0.0 {
            self.final_equity / self.initial_capital - 1.0
        } else {
            0.0
        }
    }

    /// Decision counts keyed by action label, in first-seen order.
    pub fn action_counts(&self) -> Vec<(&'static str, usize)> {
        let mut counts: Vec<(&'static str, usize)> = Vec::new();
        for decision in self.passes.iter().flat_map(|p| &p.decisions) {
            let label = decision.action.label();
            match counts.iter_mut().find(|(l, _)| *l == label) {
                Some((_, n)) => *n += 1,
                None => counts.push((label, 1)),
            }
        }
        counts
    }
}

/// Score the bar at `index` using the `lookback_bars` bars ending there.
pub fn score_window(
    pipeline: &IndicatorPipeline,
    aggregator: &ScoreAggregator,
    series: &BarSeries,
    index: usize,
    lookback_bars: usize,
) -> Result<Score, TrendError> {
    let window = series.window(index, lookback_bars);
    if window.len() < lookback_bars {
        return Err(TrendError::InsufficientHistory {
            indicator: "LOOKBACK".to_string(),
            bars: window.len(),
            minimum: lookback_bars,
        });
    }
    aggregator.score(&pipeline.compute(&window))
}

/// Run the daily loop over `timeline`, clipped to the configured date range.
///
/// Symbols are evaluated in the order of `series` on every date.
pub fn run_backtest(
    series: &[BarSeries],
    timeline: &[NaiveDate],
    trend: &TrendConfig,
    config: &BacktestConfig,
) -> Result<BacktestResult, TrendError> {
    trend.validate()?;
    config.validate()?;
    config.check_lookback(trend)?;

    let pipeline = IndicatorPipeline::new(trend.indicators);
    let aggregator = ScoreAggregator::new(trend.score)?;
    let mut engine = DecisionEngine::new(trend.decision)?;
    let mut host = SimPortfolio::new(config.initial_capital);

    let dates = clip_timeline(timeline, config.start_date, config.end_date);
    let mut passes = Vec::with_capacity(dates.len());

    for &date in &dates {
        let marks = series.iter().filter_map(|s| {
            s.index_at_or_before(date)
                .map(|i| (s.symbol().to_string(), s.bars()[i].close))
        });
        host.mark(date, marks);

        let scores: Vec<(String, Result<Score, TrendError>)> = series
            .iter()
            .filter_map(|s| {
                s.index_of(date).map(|i| {
                    (
                        s.symbol().to_string(),
                        score_window(&pipeline, &aggregator, s, i, config.lookback_bars),
                    )
                })
            })
            .collect();

        if scores.is_empty() {
            debug!(%date, "no symbol trades on this date");
        } else {
            passes.push(engine.run_pass(date, &scores, &mut host));
        }
        host.record_equity();
    }

    let final_equity = host.total_equity();
    info!(
        dates = dates.len(),
        fills = host.fills.len(),
        final_equity,
        "backtest complete"
    );

    Ok(BacktestResult {
        passes,
        open_positions: host.holding_count(),
        equity_curve: host.equity_curve,
        fills: host.fills,
        initial_capital: config.initial_capital,
        final_equity,
    })
}
