#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::HashMap;
use trendscore::domain::error::TrendError;
pub use trendscore::domain::ohlcv::{BarSeries, OhlcvBar};
use trendscore::ports::data_port::DataPort;
use trendscore::ports::execution_port::{
    ExecutionPort, HoldingSnapshot, Instruction, PortfolioSnapshot,
};

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<BarSeries, TrendError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(TrendError::DataSource {
                reason: reason.clone(),
            });
        }
        let bars = self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        BarSeries::new(symbol, bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, TrendError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

/// Host whose snapshots are set by the test. Instructions are recorded, not applied.
pub struct ScriptedHost {
    pub holdings: HashMap<String, HoldingSnapshot>,
    pub snapshot: PortfolioSnapshot,
    pub executed: Vec<Instruction>,
}

impl ScriptedHost {
    pub fn new(total_value: f64, available_cash_fraction: f64) -> Self {
        Self {
            holdings: HashMap::new(),
            snapshot: PortfolioSnapshot {
                total_value,
                available_cash_fraction,
            },
            executed: Vec::new(),
        }
    }

    pub fn hold(&mut self, symbol: &str, quantity: f64, average_price: f64, price: f64) {
        self.holdings.insert(
            symbol.to_string(),
            HoldingSnapshot {
                quantity,
                average_price,
                holdings_value: quantity * price,
            },
        );
    }
}

impl ExecutionPort for ScriptedHost {
    fn holding(&self, symbol: &str) -> HoldingSnapshot {
        self.holdings.get(symbol).copied().unwrap_or_default()
    }

    fn portfolio(&self) -> PortfolioSnapshot {
        self.snapshot
    }

    fn set_target_weight(&mut self, symbol: &str, weight: f64) {
        self.executed.push(Instruction::SetTargetWeight {
            symbol: symbol.to_string(),
            weight,
        });
    }

    fn liquidate(&mut self, symbol: &str) {
        self.executed.push(Instruction::Liquidate {
            symbol: symbol.to_string(),
        });
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(symbol: &str, date: NaiveDate, close: f64, volume: f64) -> OhlcvBar {
    OhlcvBar {
        symbol: symbol.to_string(),
        date,
        open: close,
        high: close * 1.01,
        low: close * 0.99,
        close,
        volume,
    }
}

/// Daily bars from `start`, one per calendar day.
pub fn generate_bars(
    symbol: &str,
    start: NaiveDate,
    count: usize,
    close: impl Fn(usize) -> f64,
    volume: impl Fn(usize) -> f64,
) -> Vec<OhlcvBar> {
    (0..count)
        .map(|i| make_bar(symbol, start + chrono::Duration::days(i as i64), close(i), volume(i)))
        .collect()
}

/// Strictly increasing close and volume.
pub fn rising_series(symbol: &str, count: usize) -> BarSeries {
    let bars = generate_bars(
        symbol,
        date(2024, 1, 1),
        count,
        |i| 100.0 + i as f64,
        |i| 1_000.0 + 50.0 * i as f64,
    );
    BarSeries::new(symbol, bars).unwrap()
}

/// Strictly decreasing close, constant volume.
pub fn falling_series(symbol: &str, count: usize) -> BarSeries {
    let bars = generate_bars(
        symbol,
        date(2024, 1, 1),
        count,
        |i| 200.0 - i as f64,
        |_| 1_000.0,
    );
    BarSeries::new(symbol, bars).unwrap()
}

pub fn write_csv(dir: &std::path::Path, series: &BarSeries) {
    let mut content = String::from("date,open,high,low,close,volume\n");
    for b in series.bars() {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.date.format("%Y-%m-%d"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        ));
    }
    std::fs::write(dir.join(format!("{}.csv", series.symbol())), content).unwrap();
}
