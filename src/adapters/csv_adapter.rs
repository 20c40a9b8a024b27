//! CSV file data adapter: one `<SYMBOL>.csv` per symbol.
//!
//! Expected header: `date,open,high,low,close,volume`. Rows with an empty field are
//! dropped; any other malformed row fails the whole file.
//!
//! Symbols are upper-case on this side of the port. File names match case-insensitively,
//! so `aapl.csv` serves `AAPL`.

use crate::domain::error::TrendError;
use crate::domain::ohlcv::{BarSeries, OhlcvBar};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use csv::StringRecord;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// `<SYMBOL>.csv` when present, else the first `.csv` whose stem matches ignoring case.
    fn csv_path(&self, symbol: &str) -> PathBuf {
        let exact = self.base_path.join(format!("{symbol}.csv"));
        if exact.is_file() {
            return exact;
        }
        fs::read_dir(&self.base_path)
            .into_iter()
            .flatten()
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .find(|path| {
                csv_stem(path).is_some_and(|stem| stem.eq_ignore_ascii_case(symbol))
            })
            .unwrap_or(exact)
    }
}

fn csv_stem(path: &Path) -> Option<String> {
    if path.extension().is_some_and(|ext| ext == "csv") {
        path.file_stem().map(|stem| stem.to_string_lossy().into_owned())
    } else {
        None
    }
}

fn parse_price(record: &StringRecord, column: usize, line: u64) -> Result<f64, TrendError> {
    let raw = record.get(column).ok_or_else(|| TrendError::DataSource {
        reason: format!("line {line}: missing {} column", COLUMNS[column]),
    })?;
    raw.trim().parse().map_err(|e| TrendError::DataSource {
        reason: format!("line {line}: invalid {} value '{raw}': {e}", COLUMNS[column]),
    })
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<BarSeries, TrendError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| TrendError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();
        let mut dropped = 0usize;

        for result in rdr.records() {
            let record = result.map_err(|e| TrendError::DataSource {
                reason: format!("{}: CSV parse error: {}", path.display(), e),
            })?;
            let line = record.position().map_or(0, |p| p.line());

            if (0..COLUMNS.len()).any(|i| record.get(i).is_none_or(|f| f.trim().is_empty())) {
                dropped += 1;
                continue;
            }

            let date_str = record.get(0).unwrap_or_default().trim();
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                TrendError::DataSource {
                    reason: format!("line {line}: invalid date '{date_str}': {e}"),
                }
            })?;

            if date < start_date || date > end_date {
                continue;
            }

            bars.push(OhlcvBar {
                symbol: symbol.to_string(),
                date,
                open: parse_price(&record, 1, line)?,
                high: parse_price(&record, 2, line)?,
                low: parse_price(&record, 3, line)?,
                close: parse_price(&record, 4, line)?,
                volume: parse_price(&record, 5, line)?,
            });
        }

        if dropped > 0 {
            debug!(symbol, dropped, "dropped rows with empty fields");
        }

        bars.sort_by_key(|b| b.date);
        BarSeries::new(symbol, bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, TrendError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| TrendError::DataSource {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| TrendError::DataSource {
                reason: format!("directory entry error: {}", e),
            })?;

            if let Some(stem) = csv_stem(&entry.path()) {
                symbols.push(stem.to_uppercase());
            }
        }

        symbols.sort();
        symbols.dedup();
        Ok(symbols)
    }
}
