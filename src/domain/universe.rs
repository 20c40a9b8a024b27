//! Symbol universe: parsing symbol lists and loading their bar series.

use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::{info, warn};

use crate::domain::error::TrendError;
use crate::domain::ohlcv::BarSeries;
use crate::ports::data_port::DataPort;

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),
}

/// Parse a comma-separated symbol list. Symbols are upper-cased, order is kept.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

#[derive(Debug, Clone)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct LoadedUniverse {
    pub series: Vec<BarSeries>,
    pub skipped: Vec<SkippedSymbol>,
}

impl LoadedUniverse {
    pub fn symbols(&self) -> Vec<&str> {
        self.series.iter().map(|s| s.symbol()).collect()
    }
}

/// Fetch every symbol, skipping the ones whose data cannot be loaded.
///
/// Fails only when no symbol has any data.
pub fn load_universe(
    data_port: &dyn DataPort,
    symbols: &[String],
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<LoadedUniverse, TrendError> {
    let mut series = Vec::new();
    let mut skipped = Vec::new();

    for symbol in symbols {
        match data_port.fetch_bars(symbol, start_date, end_date) {
            Ok(s) if s.is_empty() => {
                warn!(symbol = %symbol, "skipping symbol, no data found");
                skipped.push(SkippedSymbol {
                    symbol: symbol.clone(),
                    reason: "no data found".to_string(),
                });
            }
            Ok(s) => {
                info!(symbol = %symbol, bars = s.len(), "loaded");
                series.push(s);
            }
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "skipping symbol");
                skipped.push(SkippedSymbol {
                    symbol: symbol.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    if series.is_empty() {
        return Err(TrendError::NoData {
            symbol: symbols.join(","),
        });
    }

    Ok(LoadedUniverse { series, skipped })
}
