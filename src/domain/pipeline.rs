//! Indicator pipeline: one pass over a bar series producing every column the score needs.

use chrono::NaiveDate;

use crate::domain::indicator::macd::{DEFAULT_FAST, DEFAULT_SIGNAL, DEFAULT_SLOW};
use crate::domain::indicator::mfi::DEFAULT_PERIOD as DEFAULT_MFI_PERIOD;
use crate::domain::indicator::{calculate_macd, calculate_mfi, calculate_obv, IndicatorSeries};
use crate::domain::ohlcv::BarSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
    pub mfi_period: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        IndicatorParams {
            fast: DEFAULT_FAST,
            slow: DEFAULT_SLOW,
            signal: DEFAULT_SIGNAL,
            mfi_period: DEFAULT_MFI_PERIOD,
        }
    }
}

impl IndicatorParams {
    /// Bars needed before the MACD histogram is defined.
    pub fn macd_warmup(&self) -> usize {
        self.fast.max(self.slow) + self.signal
    }
}

/// A bar series' dates with every derived column aligned to them.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorFrame {
    pub symbol: String,
    pub dates: Vec<NaiveDate>,
    pub ema_fast: IndicatorSeries,
    pub ema_slow: IndicatorSeries,
    pub macd: IndicatorSeries,
    pub signal: IndicatorSeries,
    pub histogram: IndicatorSeries,
    pub obv: IndicatorSeries,
    pub mfi: IndicatorSeries,
}

impl IndicatorFrame {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn last_index(&self) -> Option<usize> {
        self.dates.len().checked_sub(1)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IndicatorPipeline {
    params: IndicatorParams,
}

impl IndicatorPipeline {
    pub fn new(params: IndicatorParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &IndicatorParams {
        &self.params
    }

    pub fn compute(&self, series: &BarSeries) -> IndicatorFrame {
        let p = &self.params;
        let macd = calculate_macd(series, p.fast, p.slow, p.signal);
        IndicatorFrame {
            symbol: series.symbol().to_string(),
            dates: series.bars().iter().map(|b| b.date).collect(),
            ema_fast: macd.ema_fast,
            ema_slow: macd.ema_slow,
            macd: macd.line,
            signal: macd.signal,
            histogram: macd.histogram,
            obv: calculate_obv(series),
            mfi: calculate_mfi(series, p.mfi_period),
        }
    }
}
