//! Technical indicator implementations.
//!
//! - `IndicatorPoint`: a single, possibly undefined, point in an indicator time series
//! - `IndicatorType`: indicator identity + parameters
//! - `IndicatorSeries`: a time series of indicator values with its warm-up length

pub mod ema;
pub mod macd;
pub mod mfi;
pub mod obv;
pub mod stddev;

pub use ema::ema_values;
pub use macd::{calculate_macd, MacdSeries};
pub use mfi::calculate_mfi;
pub use obv::calculate_obv;
pub use stddev::sample_stddev;

use chrono::NaiveDate;
use std::fmt;

use crate::domain::error::TrendError;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    /// `None` until the indicator's warm-up is complete.
    pub value: Option<f64>,
}

impl IndicatorPoint {
    pub fn is_valid(&self) -> bool {
        self.value.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Ema(usize),
    MacdLine { fast: usize, slow: usize },
    MacdSignal {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    MacdHistogram {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Obv,
    Mfi(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    /// Number of bars needed before the first defined value.
    pub warmup: usize,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub(crate) fn empty(indicator_type: IndicatorType, warmup: usize) -> Self {
        IndicatorSeries {
            indicator_type,
            warmup,
            values: Vec::new(),
        }
    }

    /// Build a series from raw recurrence output, masking everything before `warmup` bars.
    pub(crate) fn masked(
        indicator_type: IndicatorType,
        warmup: usize,
        dates: &[NaiveDate],
        raw: &[f64],
    ) -> Self {
        let values = dates
            .iter()
            .zip(raw)
            .enumerate()
            .map(|(i, (&date, &v))| IndicatorPoint {
                date,
                value: (i + 1 >= warmup).then_some(v),
            })
            .collect();
        IndicatorSeries {
            indicator_type,
            warmup,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True when at least one value is defined.
    pub fn has_values(&self) -> bool {
        self.values.iter().any(IndicatorPoint::is_valid)
    }

    /// The value at `index`, or `InsufficientHistory` if it is undefined.
    pub fn require(&self, index: usize) -> Result<f64, TrendError> {
        self.values
            .get(index)
            .and_then(|p| p.value)
            .ok_or_else(|| TrendError::InsufficientHistory {
                indicator: self.indicator_type.to_string(),
                bars: (index + 1).min(self.values.len()),
                minimum: self.warmup,
            })
    }

    pub fn latest(&self) -> Result<f64, TrendError> {
        match self.values.len() {
            0 => Err(TrendError::InsufficientHistory {
                indicator: self.indicator_type.to_string(),
                bars: 0,
                minimum: self.warmup,
            }),
            n => self.require(n - 1),
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Ema(span) => write!(f, "EMA({})", span),
            IndicatorType::MacdLine { fast, slow } => write!(f, "MACD({},{})", fast, slow),
            IndicatorType::MacdSignal { fast, slow, signal } => {
                write!(f, "MACD_SIGNAL({},{},{})", fast, slow, signal)
            }
            IndicatorType::MacdHistogram { fast, slow, signal } => {
                write!(f, "MACD_HIST({},{},{})", fast, slow, signal)
            }
            IndicatorType::Obv => write!(f, "OBV"),
            IndicatorType::Mfi(period) => write!(f, "MFI({})", period),
        }
    }
}

/// Sign of a difference as used by OBV and MFI: 0 when unchanged.
pub(crate) fn direction(delta: f64) -> f64 {
    if delta > 0.0 {
        1.0
    } else if delta < 0.0 {
        -1.0
    } else {
        0.0
    }
}
