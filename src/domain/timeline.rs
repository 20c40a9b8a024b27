//! Unified evaluation timeline across symbols.

use chrono::NaiveDate;
use std::collections::BTreeSet;

use crate::domain::ohlcv::BarSeries;

/// Every date on which at least one series has a bar, ascending and deduplicated.
pub fn build_unified_timeline(series: &[BarSeries]) -> Vec<NaiveDate> {
    let unique_dates: BTreeSet<NaiveDate> = series
        .iter()
        .flat_map(|s| s.bars().iter().map(|bar| bar.date))
        .collect();
    unique_dates.into_iter().collect()
}

/// Timeline dates inside `[start, end]`.
pub fn clip_timeline(timeline: &[NaiveDate], start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    timeline
        .iter()
        .copied()
        .filter(|d| *d >= start && *d <= end)
        .collect()
}
