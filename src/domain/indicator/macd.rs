//! MACD (Moving Average Convergence Divergence).
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! All three EMAs use the adjust=false recurrence from the first bar. The histogram is
//! reported from bar `slow + signal` onward.

use crate::domain::indicator::{ema_values, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::BarSeries;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

/// The five MACD columns, aligned with the input bars.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub ema_fast: IndicatorSeries,
    pub ema_slow: IndicatorSeries,
    pub line: IndicatorSeries,
    pub signal: IndicatorSeries,
    pub histogram: IndicatorSeries,
}

pub fn calculate_macd(
    series: &BarSeries,
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> MacdSeries {
    let long = fast.max(slow);
    let line_type = IndicatorType::MacdLine { fast, slow };
    let signal_type = IndicatorType::MacdSignal {
        fast,
        slow,
        signal: signal_period,
    };
    let hist_type = IndicatorType::MacdHistogram {
        fast,
        slow,
        signal: signal_period,
    };
    let signal_warmup = long + signal_period;

    if series.is_empty() || fast == 0 || slow == 0 || signal_period == 0 {
        return MacdSeries {
            ema_fast: IndicatorSeries::empty(IndicatorType::Ema(fast), fast),
            ema_slow: IndicatorSeries::empty(IndicatorType::Ema(slow), slow),
            line: IndicatorSeries::empty(line_type, long),
            signal: IndicatorSeries::empty(signal_type, signal_warmup),
            histogram: IndicatorSeries::empty(hist_type, signal_warmup),
        };
    }

    let dates: Vec<_> = series.bars().iter().map(|b| b.date).collect();
    let closes = series.closes();

    let ema_fast = ema_values(&closes, fast);
    let ema_slow = ema_values(&closes, slow);
    let line: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| f - s)
        .collect();
    let signal = ema_values(&line, signal_period);
    let histogram: Vec<f64> = line.iter().zip(&signal).map(|(m, s)| m - s).collect();

    MacdSeries {
        ema_fast: IndicatorSeries::masked(IndicatorType::Ema(fast), fast, &dates, &ema_fast),
        ema_slow: IndicatorSeries::masked(IndicatorType::Ema(slow), slow, &dates, &ema_slow),
        line: IndicatorSeries::masked(line_type, long, &dates, &line),
        signal: IndicatorSeries::masked(signal_type, signal_warmup, &dates, &signal),
        histogram: IndicatorSeries::masked(hist_type, signal_warmup, &dates, &histogram),
    }
}
