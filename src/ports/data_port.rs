//! Market-data provider port.

use crate::domain::error::TrendError;
use crate::domain::ohlcv::BarSeries;
use chrono::NaiveDate;

/// Supplies daily bars in ascending date order. Missing days are absent, never zero-filled.
pub trait DataPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<BarSeries, TrendError>;

    fn list_symbols(&self) -> Result<Vec<String>, TrendError>;
}
