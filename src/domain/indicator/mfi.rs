//! MFI (Money Flow Index).
//!
//! TP = (H+L+C)/3, RMF = TP·V, direction = sign(TP[t] − TP[t−1]) (0 on the first bar).
//! Positive/negative flow are trailing sums of RMF over exactly `period` bars where the
//! direction is up/down. MFI = 100 − 100/(1 + pos/(neg + ε)).

use crate::domain::indicator::{direction, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::BarSeries;

pub const DEFAULT_PERIOD: usize = 14;
pub const MFI_EPSILON: f64 = 1e-9;

pub fn calculate_mfi(series: &BarSeries, period: usize) -> IndicatorSeries {
    if period == 0 || series.is_empty() {
        return IndicatorSeries::empty(IndicatorType::Mfi(period), period);
    }

    let bars = series.bars();
    let dates: Vec<_> = bars.iter().map(|b| b.date).collect();

    let mut positive = Vec::with_capacity(bars.len());
    let mut negative = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        let tp = bar.typical_price();
        let rmf = tp * bar.volume;
        let dir = if i == 0 {
            0.0
        } else {
            direction(tp - bars[i - 1].typical_price())
        };
        positive.push(if dir > 0.0 { rmf } else { 0.0 });
        negative.push(if dir < 0.0 { rmf } else { 0.0 });
    }

    let raw: Vec<f64> = (0..bars.len())
        .map(|i| {
            if i + 1 < period {
                return 0.0;
            }
            let start = i + 1 - period;
            let pos: f64 = positive[start..=i].iter().sum();
            let neg: f64 = negative[start..=i].iter().sum::<f64>().abs();
            let ratio = pos / (neg + MFI_EPSILON);
            100.0 - 100.0 / (1.0 + ratio)
        })
        .collect();

    IndicatorSeries::masked(IndicatorType::Mfi(period), period, &dates, &raw)
}
