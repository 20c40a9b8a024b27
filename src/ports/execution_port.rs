//! Execution host port: portfolio snapshot in, two action verbs out.

use std::fmt;

/// What the host reports about one symbol's holding.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HoldingSnapshot {
    pub quantity: f64,
    pub average_price: f64,
    pub holdings_value: f64,
}

impl HoldingSnapshot {
    pub fn is_flat(&self) -> bool {
        self.quantity == 0.0
    }

    pub fn cost_basis(&self) -> f64 {
        self.average_price * self.quantity
    }

    pub fn unrealized_profit(&self) -> f64 {
        self.holdings_value - self.cost_basis()
    }

    /// Unrealized profit as a fraction of cost basis; 0 when flat.
    pub fn unrealized_fraction(&self) -> f64 {
        self.unrealized_profit() / (self.cost_basis() + 1e-9)
    }
}

/// Portfolio-wide figures the decision engine reads before each symbol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortfolioSnapshot {
    pub total_value: f64,
    /// Cash not committed to any symbol, as a fraction of `total_value`.
    pub available_cash_fraction: f64,
}

impl PortfolioSnapshot {
    pub fn weight_of(&self, holding: &HoldingSnapshot) -> f64 {
        if self.total_value > 0.0 {
            holding.holdings_value / self.total_value
        } else {
            0.0
        }
    }
}

/// The only instructions the decision engine may send to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    SetTargetWeight { symbol: String, weight: f64 },
    Liquidate { symbol: String },
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::SetTargetWeight { symbol, weight } => {
                write!(f, "SET_TARGET({}, {:.4})", symbol, weight)
            }
            Instruction::Liquidate { symbol } => write!(f, "LIQUIDATE({})", symbol),
        }
    }
}

/// Execution host as seen by the decision engine.
///
/// Implementations apply instructions before returning, so the next snapshot reflects them.
pub trait ExecutionPort {
    fn holding(&self, symbol: &str) -> HoldingSnapshot;
    fn portfolio(&self) -> PortfolioSnapshot;
    fn set_target_weight(&mut self, symbol: &str, weight: f64);
    fn liquidate(&mut self, symbol: &str);

    fn execute(&mut self, instruction: &Instruction) {
        match instruction {
            Instruction::SetTargetWeight { symbol, weight } => {
                self.set_target_weight(symbol, *weight)
            }
            Instruction::Liquidate { symbol } => self.liquidate(symbol),
        }
    }
}
