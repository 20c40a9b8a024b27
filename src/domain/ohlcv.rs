//! OHLCV bars and validated bar series.

use chrono::NaiveDate;

use crate::domain::error::TrendError;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl OhlcvBar {
    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    fn check(&self) -> Result<(), String> {
        for (name, value) in [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("{name} must be a positive number, got {value}"));
            }
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err(format!("volume must be non-negative, got {}", self.volume));
        }
        if self.high < self.low {
            return Err(format!("high {} below low {}", self.high, self.low));
        }
        if self.high < self.open.max(self.close) {
            return Err(format!("high {} below open/close", self.high));
        }
        if self.low > self.open.min(self.close) {
            return Err(format!("low {} above open/close", self.low));
        }
        Ok(())
    }
}

/// Bars for one symbol in strictly increasing date order.
///
/// Only constructible through [`BarSeries::new`], which rejects the whole series on the
/// first bar that breaks an ordering or field invariant.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    symbol: String,
    bars: Vec<OhlcvBar>,
}

impl BarSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<OhlcvBar>) -> Result<Self, TrendError> {
        let symbol = symbol.into();
        let reject = |index: usize, reason: String| TrendError::DataIntegrity {
            symbol: symbol.clone(),
            index,
            reason,
        };

        for (i, bar) in bars.iter().enumerate() {
            bar.check().map_err(|reason| reject(i, reason))?;
            if i > 0 && bar.date <= bars[i - 1].date {
                return Err(reject(
                    i,
                    format!(
                        "date {} does not follow {}",
                        bar.date,
                        bars[i - 1].date
                    ),
                ));
            }
        }

        Ok(Self { symbol, bars })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&OhlcvBar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Bars `[..=end]` as a new series. `end` past the last bar is clamped.
    pub fn prefix(&self, end: usize) -> BarSeries {
        let stop = (end + 1).min(self.bars.len());
        BarSeries {
            symbol: self.symbol.clone(),
            bars: self.bars[..stop].to_vec(),
        }
    }

    /// The trailing `count` bars ending at index `end` (inclusive).
    pub fn window(&self, end: usize, count: usize) -> BarSeries {
        let stop = (end + 1).min(self.bars.len());
        let start = stop.saturating_sub(count);
        BarSeries {
            symbol: self.symbol.clone(),
            bars: self.bars[start..stop].to_vec(),
        }
    }

    /// Index of the last bar dated on or before `date`.
    pub fn index_at_or_before(&self, date: NaiveDate) -> Option<usize> {
        match self.bars.binary_search_by_key(&date, |b| b.date) {
            Ok(i) => Some(i),
            Err(0) => None,
            Err(i) => Some(i - 1),
        }
    }

    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.bars.binary_search_by_key(&date, |b| b.date).ok()
    }
}
