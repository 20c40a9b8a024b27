//! Simulated execution host: cash plus whole-share holdings marked at the close.

use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::ports::execution_port::{ExecutionPort, HoldingSnapshot, PortfolioSnapshot};

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Holding {
    pub quantity: i64,
    pub average_price: f64,
}

impl Holding {
    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity as f64 * price
    }
}

/// One executed trade. Positive quantity buys, negative sells.
#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub date: NaiveDate,
    pub symbol: String,
    pub quantity: i64,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimPortfolio {
    pub cash: f64,
    pub initial_capital: f64,
    pub holdings: HashMap<String, Holding>,
    pub fills: Vec<Fill>,
    pub equity_curve: Vec<EquityPoint>,
    prices: HashMap<String, f64>,
    date: Option<NaiveDate>,
}

impl SimPortfolio {
    pub fn new(initial_capital: f64) -> Self {
        SimPortfolio {
            cash: initial_capital,
            initial_capital,
            holdings: HashMap::new(),
            fills: Vec::new(),
            equity_curve: Vec::new(),
            prices: HashMap::new(),
            date: None,
        }
    }

    /// Advance to `date` and update the marks for the given symbols.
    ///
    /// Symbols not mentioned keep their previous mark.
    pub fn mark<I, S>(&mut self, date: NaiveDate, prices: I)
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        self.date = Some(date);
        for (symbol, price) in prices {
            self.prices.insert(symbol.into(), price);
        }
    }

    pub fn price(&self, symbol: &str) -> Option<f64> {
        self.prices.get(symbol).copied()
    }

    pub fn get_holding(&self, symbol: &str) -> Option<&Holding> {
        self.holdings.get(symbol)
    }

    pub fn holding_count(&self) -> usize {
        self.holdings.len()
    }

    pub fn holdings_value(&self) -> f64 {
        self.holdings
            .iter()
            .filter_map(|(symbol, h)| self.price(symbol).map(|p| h.market_value(p)))
            .sum()
    }

    pub fn total_equity(&self) -> f64 {
        self.cash + self.holdings_value()
    }

    /// Append the current equity under the current mark date.
    pub fn record_equity(&mut self) {
        if let Some(date) = self.date {
            let equity = self.total_equity();
            self.equity_curve.push(EquityPoint { date, equity });
        }
    }

    fn trade(&mut self, symbol: &str, quantity: i64, price: f64) {
        if quantity == 0 {
            return;
        }
        self.cash -= quantity as f64 * price;

        let held = self.holdings.get(symbol).copied().unwrap_or(Holding {
            quantity: 0,
            average_price: 0.0,
        });
        let new_quantity = held.quantity + quantity;
        if new_quantity <= 0 {
            self.holdings.remove(symbol);
        } else {
            let average_price = if quantity > 0 {
                (held.quantity as f64 * held.average_price + quantity as f64 * price)
                    / new_quantity as f64
            } else {
                held.average_price
            };
            self.holdings.insert(
                symbol.to_string(),
                Holding {
                    quantity: new_quantity,
                    average_price,
                },
            );
        }

        if let Some(date) = self.date {
            self.fills.push(Fill {
                date,
                symbol: symbol.to_string(),
                quantity,
                price,
            });
        }
        debug!(symbol, quantity, price, cash = self.cash, "fill");
    }
}

impl ExecutionPort for SimPortfolio {
    fn holding(&self, symbol: &str) -> HoldingSnapshot {
        match (self.holdings.get(symbol), self.price(symbol)) {
            (Some(h), Some(price)) => HoldingSnapshot {
                quantity: h.quantity as f64,
                average_price: h.average_price,
                holdings_value: h.market_value(price),
            },
            _ => HoldingSnapshot::default(),
        }
    }

    fn portfolio(&self) -> PortfolioSnapshot {
        let total_value = self.total_equity();
        let available_cash_fraction = if total_value > 0.0 {
            self.cash / total_value
        } else {
            0.0
        };
        PortfolioSnapshot {
            total_value,
            available_cash_fraction,
        }
    }

    /// Rebalance to `weight` of total equity in whole shares, never spending more than cash.
    fn set_target_weight(&mut self, symbol: &str, weight: f64) {
        let Some(price) = self.price(symbol) else {
            warn!(symbol, "no price mark, target weight ignored");
            return;
        };
        let current = self.holdings.get(symbol).map_or(0, |h| h.quantity);
        let target_value = weight.max(0.0) * self.total_equity();
        let target = (target_value / price).floor() as i64;

        let mut delta = target - current;
        if delta > 0 {
            let affordable = (self.cash.max(0.0) / price).floor() as i64;
            delta = delta.min(affordable);
        }
        self.trade(symbol, delta, price);
    }

    fn liquidate(&mut self, symbol: &str) {
        let Some(quantity) = self.holdings.get(symbol).map(|h| h.quantity) else {
            return;
        };
        let Some(price) = self.price(symbol) else {
            warn!(symbol, "no price mark, liquidation ignored");
            return;
        };
        self.trade(symbol, -quantity, price);
    }
}
