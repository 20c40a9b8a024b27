//! Composite trend score.
//!
//! S = w_macd · tanh(H_t / (σ_H + ε))
//!   + w_mfi  · clip((MFI_t − 50) / 50, −1, 1)
//!   + w_obv  · tanh((OBV_t − OBV_{t−N}) / (|OBV_{t−N}| + ε))
//!
//! σ_H is the sample standard deviation of the last `macd_std_window` histogram values.
//! Each term lies in [−1, 1], so with non-negative weights summing to 1 the score does too.

use chrono::NaiveDate;

use crate::domain::error::TrendError;
use crate::domain::indicator::sample_stddev;
use crate::domain::ohlcv::BarSeries;
use crate::domain::pipeline::{IndicatorFrame, IndicatorPipeline};

pub const SCORE_EPSILON: f64 = 1e-9;
const WEIGHT_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub macd: f64,
    pub mfi: f64,
    pub obv: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        ScoreWeights {
            macd: 0.4,
            mfi: 0.3,
            obv: 0.3,
        }
    }
}

impl ScoreWeights {
    pub fn sum(&self) -> f64 {
        self.macd + self.mfi + self.obv
    }

    /// Weights must each lie in [0, 1] and sum to 1. They are never renormalized.
    pub fn validate(&self) -> Result<(), TrendError> {
        for (key, w) in [
            ("weight_macd", self.macd),
            ("weight_mfi", self.mfi),
            ("weight_obv", self.obv),
        ] {
            if !w.is_finite() || !(0.0..=1.0).contains(&w) {
                return Err(TrendError::config_invalid(
                    "score",
                    key,
                    format!("weight must be between 0 and 1, got {w}"),
                ));
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(TrendError::config_invalid(
                "score",
                "weights",
                format!("weights must sum to 1, got {sum}"),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreParams {
    pub weights: ScoreWeights,
    pub macd_std_window: usize,
    pub obv_slope_window: usize,
}

impl Default for ScoreParams {
    fn default() -> Self {
        ScoreParams {
            weights: ScoreWeights::default(),
            macd_std_window: 5,
            obv_slope_window: 5,
        }
    }
}

impl ScoreParams {
    pub fn validate(&self) -> Result<(), TrendError> {
        self.weights.validate()?;
        if self.macd_std_window < 2 {
            return Err(TrendError::config_invalid(
                "score",
                "macd_std_window",
                "macd_std_window must be at least 2",
            ));
        }
        if self.obv_slope_window == 0 {
            return Err(TrendError::config_invalid(
                "score",
                "obv_slope_window",
                "obv_slope_window must be positive",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    pub date: NaiveDate,
    pub value: f64,
    pub macd_signal: f64,
    pub mfi_signal: f64,
    pub obv_signal: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct ScoreAggregator {
    params: ScoreParams,
}

impl ScoreAggregator {
    pub fn new(params: ScoreParams) -> Result<Self, TrendError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &ScoreParams {
        &self.params
    }

    /// Score the latest bar of the frame.
    pub fn score(&self, frame: &IndicatorFrame) -> Result<Score, TrendError> {
        let index = frame
            .last_index()
            .ok_or_else(|| TrendError::InsufficientHistory {
                indicator: frame.histogram.indicator_type.to_string(),
                bars: 0,
                minimum: frame.histogram.warmup + self.params.macd_std_window - 1,
            })?;
        self.score_at(frame, index)
    }

    /// Score the bar at `index` using only values up to and including it.
    pub fn score_at(&self, frame: &IndicatorFrame, index: usize) -> Result<Score, TrendError> {
        let macd_signal = self.macd_signal(frame, index)?;
        let mfi_signal = ((frame.mfi.require(index)? - 50.0) / 50.0).clamp(-1.0, 1.0);
        let obv_signal = self.obv_signal(frame, index)?;

        let w = &self.params.weights;
        let value = (w.macd * macd_signal + w.mfi * mfi_signal + w.obv * obv_signal)
            .clamp(-1.0, 1.0);

        Ok(Score {
            date: frame.dates[index],
            value,
            macd_signal,
            mfi_signal,
            obv_signal,
        })
    }

    fn macd_signal(&self, frame: &IndicatorFrame, index: usize) -> Result<f64, TrendError> {
        let window = self.params.macd_std_window;
        let hist = &frame.histogram;
        let insufficient = || TrendError::InsufficientHistory {
            indicator: hist.indicator_type.to_string(),
            bars: (index + 1).min(hist.len()),
            minimum: hist.warmup + window - 1,
        };

        if index + 1 < window {
            return Err(insufficient());
        }
        let values = (index + 1 - window..=index)
            .map(|i| hist.require(i))
            .collect::<Result<Vec<f64>, _>>()
            .map_err(|_| insufficient())?;

        let std = sample_stddev(&values).ok_or_else(insufficient)?;
        Ok((values[window - 1] / (std + SCORE_EPSILON)).tanh())
    }

    fn obv_signal(&self, frame: &IndicatorFrame, index: usize) -> Result<f64, TrendError> {
        let window = self.params.obv_slope_window;
        let obv = &frame.obv;
        if index < window {
            return Err(TrendError::InsufficientHistory {
                indicator: obv.indicator_type.to_string(),
                bars: (index + 1).min(obv.len()),
                minimum: window + 1,
            });
        }
        let latest = obv.require(index)?;
        let start = obv.require(index - window)?;
        Ok(((latest - start) / (start.abs() + SCORE_EPSILON)).tanh())
    }
}

/// Scores for each of the last `days` bars of `series`, oldest first.
///
/// Indicators only look backwards, so scoring bar `i` of the full frame equals scoring the
/// series truncated at `i`. Bars without enough history are left out.
pub fn score_history(
    pipeline: &IndicatorPipeline,
    aggregator: &ScoreAggregator,
    series: &BarSeries,
    days: usize,
) -> Vec<Score> {
    let frame = pipeline.compute(series);
    let start = frame.len().saturating_sub(days);
    (start..frame.len())
        .filter_map(|i| aggregator.score_at(&frame, i).ok())
        .collect()
}
