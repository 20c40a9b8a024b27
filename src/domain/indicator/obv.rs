//! OBV (On-Balance Volume).

use crate::domain::indicator::{direction, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::BarSeries;

/// Calculate OBV.
///
/// OBV[0] = 0
/// OBV[i] = OBV[i-1] + sign(close[i] - close[i-1]) * volume[i]
///
/// No warmup period; every bar is defined.
pub fn calculate_obv(series: &BarSeries) -> IndicatorSeries {
    let bars = series.bars();
    let dates: Vec<_> = bars.iter().map(|b| b.date).collect();
    let mut raw = Vec::with_capacity(bars.len());
    let mut obv = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        if i > 0 {
            obv += direction(bar.close - bars[i - 1].close) * bar.volume;
        }
        raw.push(obv);
    }

    IndicatorSeries::masked(IndicatorType::Obv, 1, &dates, &raw)
}
