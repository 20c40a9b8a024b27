//! Decision engine: per-symbol actions from a score, the position book and a host snapshot.
//!
//! Two policies share one engine:
//!
//! - **Simple**: a positive score targets `max_weight`; a negative score on a profitable
//!   holding liquidates it.
//! - **Constrained**: incremental entries gated by a cash reserve, at most `max_adds`
//!   averaging-down adds, and partial profit-taking. A losing position is never sold on a
//!   negative score alone.
//!
//! In both, a full exit is suppressed while the position is younger than `min_hold_days`.

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, error, info, warn};

use crate::domain::error::TrendError;
use crate::domain::position::{PositionBook, PositionState};
use crate::domain::score::Score;
use crate::ports::execution_port::{
    ExecutionPort, HoldingSnapshot, Instruction, PortfolioSnapshot,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    Simple,
    Constrained,
}

impl FromStr for Policy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "simple" => Ok(Policy::Simple),
            "constrained" => Ok(Policy::Constrained),
            other => Err(format!(
                "unknown policy '{other}', expected 'simple' or 'constrained'"
            )),
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::Simple => write!(f, "simple"),
            Policy::Constrained => write!(f, "constrained"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionParams {
    pub policy: Policy,
    pub max_weight: f64,
    pub cash_reserve: f64,
    pub max_adds: u32,
    pub profit_take_pct: f64,
    pub min_hold_days: u32,
    /// Weight added per constrained entry or averaging-down step.
    pub weight_step: f64,
}

impl Default for DecisionParams {
    fn default() -> Self {
        DecisionParams {
            policy: Policy::Constrained,
            max_weight: 0.10,
            cash_reserve: 0.20,
            max_adds: 3,
            profit_take_pct: 0.05,
            min_hold_days: 7,
            weight_step: 0.05,
        }
    }
}

impl DecisionParams {
    pub fn validate(&self) -> Result<(), TrendError> {
        if !(self.max_weight > 0.0 && self.max_weight <= 1.0) {
            return Err(TrendError::config_invalid(
                "decision",
                "max_weight",
                "max_weight must be in (0, 1]",
            ));
        }
        if !(0.0..1.0).contains(&self.cash_reserve) {
            return Err(TrendError::config_invalid(
                "decision",
                "cash_reserve",
                "cash_reserve must be in [0, 1)",
            ));
        }
        if !(self.profit_take_pct.is_finite() && self.profit_take_pct >= 0.0) {
            return Err(TrendError::config_invalid(
                "decision",
                "profit_take_pct",
                "profit_take_pct must be non-negative",
            ));
        }
        if !(self.weight_step > 0.0 && self.weight_step <= 1.0) {
            return Err(TrendError::config_invalid(
                "decision",
                "weight_step",
                "weight_step must be in (0, 1]",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldReason {
    NoSignal,
    MinimumHold,
    CashReserve,
    MaxAdds,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// FLAT → HOLDING.
    Enter { target_weight: f64 },
    /// Re-assert or raise the weight of an existing holding.
    Add { target_weight: f64 },
    /// Add to a losing holding; counts against `max_adds`.
    AverageDown { target_weight: f64 },
    /// Reduce a profitable holding without closing it.
    PartialExit { target_weight: f64 },
    /// HOLDING → FLAT.
    Exit,
    Hold(HoldReason),
    /// No score for this step; nothing was evaluated.
    Skip { reason: String },
}

impl Action {
    pub fn instruction(&self, symbol: &str) -> Option<Instruction> {
        match *self {
            Action::Enter { target_weight }
            | Action::Add { target_weight }
            | Action::AverageDown { target_weight }
            | Action::PartialExit { target_weight } => Some(Instruction::SetTargetWeight {
                symbol: symbol.to_string(),
                weight: target_weight,
            }),
            Action::Exit => Some(Instruction::Liquidate {
                symbol: symbol.to_string(),
            }),
            Action::Hold(_) | Action::Skip { .. } => None,
        }
    }

    pub fn is_entry_or_add(&self) -> bool {
        matches!(
            self,
            Action::Enter { .. } | Action::Add { .. } | Action::AverageDown { .. }
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            Action::Enter { .. } => "enter",
            Action::Add { .. } => "add",
            Action::AverageDown { .. } => "average_down",
            Action::PartialExit { .. } => "partial_exit",
            Action::Exit => "exit",
            Action::Hold(_) => "hold",
            Action::Skip { .. } => "skip",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub symbol: String,
    pub date: NaiveDate,
    pub score: Option<f64>,
    /// Cash fraction the host reported just before this symbol was decided.
    pub available_cash_fraction: Option<f64>,
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PassReport {
    pub date: NaiveDate,
    pub decisions: Vec<Decision>,
}

impl PassReport {
    pub fn instructions(&self) -> Vec<Instruction> {
        self.decisions
            .iter()
            .filter_map(|d| d.action.instruction(&d.symbol))
            .collect()
    }

    pub fn skipped(&self) -> usize {
        self.decisions
            .iter()
            .filter(|d| matches!(d.action, Action::Skip { .. }))
            .count()
    }

    pub fn decision(&self, symbol: &str) -> Option<&Decision> {
        self.decisions.iter().find(|d| d.symbol == symbol)
    }
}

#[derive(Debug, Clone)]
pub struct DecisionEngine {
    params: DecisionParams,
    positions: PositionBook,
}

impl DecisionEngine {
    pub fn new(params: DecisionParams) -> Result<Self, TrendError> {
        params.validate()?;
        Ok(Self {
            params,
            positions: PositionBook::new(),
        })
    }

    pub fn params(&self) -> &DecisionParams {
        &self.params
    }

    pub fn positions(&self) -> &PositionBook {
        &self.positions
    }

    pub fn position(&self, symbol: &str) -> Option<&PositionState> {
        self.positions.get(symbol)
    }

    /// Decide one symbol and update its position state. Pure apart from the book.
    pub fn decide(
        &mut self,
        symbol: &str,
        date: NaiveDate,
        score: f64,
        holding: &HoldingSnapshot,
        portfolio: &PortfolioSnapshot,
    ) -> Action {
        if holding.is_flat() && self.positions.reset(symbol).is_some() {
            debug!(symbol, "host reports flat, position state reset");
        }

        match self.params.policy {
            Policy::Simple => self.decide_simple(symbol, date, score, holding),
            Policy::Constrained => self.decide_constrained(symbol, date, score, holding, portfolio),
        }
    }

    fn decide_simple(
        &mut self,
        symbol: &str,
        date: NaiveDate,
        score: f64,
        holding: &HoldingSnapshot,
    ) -> Action {
        let target = self.params.max_weight;

        // Covers bottom-fishing too: a losing holding with a positive score is topped up.
        if score > 0.0 {
            if holding.is_flat() || !self.positions.is_holding(symbol) {
                self.positions.open(symbol, date, target);
                if holding.is_flat() {
                    return Action::Enter {
                        target_weight: target,
                    };
                }
            } else {
                self.positions.retarget(symbol, target);
            }
            return Action::Add {
                target_weight: target,
            };
        }

        if score < 0.0 && !holding.is_flat() && holding.unrealized_profit() > 0.0 {
            return self.full_exit(symbol, date);
        }

        Action::Hold(HoldReason::NoSignal)
    }

    fn decide_constrained(
        &mut self,
        symbol: &str,
        date: NaiveDate,
        score: f64,
        holding: &HoldingSnapshot,
        portfolio: &PortfolioSnapshot,
    ) -> Action {
        let p = self.params;
        let current_weight = portfolio.weight_of(holding);
        let unrealized = holding.unrealized_fraction();

        if score > 0.0 {
            if portfolio.available_cash_fraction <= p.cash_reserve {
                return Action::Hold(HoldReason::CashReserve);
            }
            let target = p.max_weight.min(current_weight + p.weight_step);

            if holding.is_flat() {
                self.positions.open(symbol, date, target);
                return Action::Enter {
                    target_weight: target,
                };
            }
            if unrealized < 0.0 {
                let adds = self.positions.get(symbol).map_or(0, |s| s.add_count);
                if adds >= p.max_adds {
                    return Action::Hold(HoldReason::MaxAdds);
                }
                self.positions.record_add(symbol, date, target);
                return Action::AverageDown {
                    target_weight: target,
                };
            }
            return Action::Hold(HoldReason::NoSignal);
        }

        if score < 0.0 && !holding.is_flat() && unrealized > p.profit_take_pct {
            let target = current_weight / 2.0;
            self.positions.retarget(symbol, target);
            return Action::PartialExit {
                target_weight: target,
            };
        }

        Action::Hold(HoldReason::NoSignal)
    }

    fn full_exit(&mut self, symbol: &str, date: NaiveDate) -> Action {
        let min_hold = self.params.min_hold_days;
        if self
            .positions
            .get(symbol)
            .is_some_and(|s| s.within_min_hold(date, min_hold))
        {
            return Action::Hold(HoldReason::MinimumHold);
        }
        self.positions.reset(symbol);
        Action::Exit
    }

    /// Decide one symbol against the host and send the resulting instruction, if any.
    pub fn evaluate(
        &mut self,
        symbol: &str,
        date: NaiveDate,
        scored: &Result<Score, TrendError>,
        host: &mut dyn ExecutionPort,
    ) -> Decision {
        let score = match scored {
            Ok(score) => score.value,
            Err(e) => {
                if e.is_per_symbol() {
                    warn!(symbol, %date, error = %e, "skipping symbol");
                } else {
                    error!(symbol, %date, error = %e, "skipping symbol on unexpected error");
                }
                return Decision {
                    symbol: symbol.to_string(),
                    date,
                    score: None,
                    available_cash_fraction: None,
                    action: Action::Skip {
                        reason: e.to_string(),
                    },
                };
            }
        };

        let holding = host.holding(symbol);
        let portfolio = host.portfolio();
        let action = self.decide(symbol, date, score, &holding, &portfolio);

        if let Some(instruction) = action.instruction(symbol) {
            info!(%date, score, action = action.label(), "{}", instruction);
            host.execute(&instruction);
        }

        Decision {
            symbol: symbol.to_string(),
            date,
            score: Some(score),
            available_cash_fraction: Some(portfolio.available_cash_fraction),
            action,
        }
    }

    /// One evaluation pass in the given symbol order.
    ///
    /// Must stay sequential: every instruction changes the cash the next symbol sees.
    pub fn run_pass(
        &mut self,
        date: NaiveDate,
        scores: &[(String, Result<Score, TrendError>)],
        host: &mut dyn ExecutionPort,
    ) -> PassReport {
        let decisions: Vec<Decision> = scores
            .iter()
            .map(|(symbol, scored)| self.evaluate(symbol, date, scored, host))
            .collect();

        let report = PassReport { date, decisions };
        debug!(
            %date,
            symbols = report.decisions.len(),
            instructions = report.instructions().len(),
            skipped = report.skipped(),
            "pass complete"
        );
        report
    }
}
