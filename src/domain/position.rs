//! Per-symbol position state tracked by the decision engine.

use chrono::NaiveDate;
use std::collections::HashMap;

/// Decision-layer memory for one symbol.
///
/// FLAT is represented by the absence of a record in [`PositionBook`]; a record exists only
/// while the engine considers the symbol held.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionState {
    /// Averaging-down entries taken since the position was opened.
    pub add_count: u32,
    /// First entry, refreshed by every averaging-down add.
    pub entry_date: Option<NaiveDate>,
    /// Last requested portfolio weight.
    pub target_weight: f64,
}

impl PositionState {
    pub fn opened(date: NaiveDate, target_weight: f64) -> Self {
        PositionState {
            add_count: 0,
            entry_date: Some(date),
            target_weight,
        }
    }

    /// Days since `entry_date`, or `None` when no entry is recorded.
    pub fn days_held(&self, today: NaiveDate) -> Option<i64> {
        self.entry_date.map(|d| (today - d).num_days())
    }

    /// True while the position is younger than `min_hold_days`.
    pub fn within_min_hold(&self, today: NaiveDate, min_hold_days: u32) -> bool {
        self.days_held(today)
            .is_some_and(|days| days < i64::from(min_hold_days))
    }
}

/// Position state for every symbol the engine has touched, keyed by symbol.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionBook {
    states: HashMap<String, PositionState>,
}

impl PositionBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, symbol: &str) -> Option<&PositionState> {
        self.states.get(symbol)
    }

    pub fn is_holding(&self, symbol: &str) -> bool {
        self.states.contains_key(symbol)
    }

    /// FLAT → HOLDING. Replaces any stale record.
    pub fn open(&mut self, symbol: &str, date: NaiveDate, target_weight: f64) -> &PositionState {
        self.states.insert(
            symbol.to_string(),
            PositionState::opened(date, target_weight),
        );
        &self.states[symbol]
    }

    /// Record an averaging-down add: bump the counter and refresh the entry date.
    pub fn record_add(&mut self, symbol: &str, date: NaiveDate, target_weight: f64) {
        let state = self
            .states
            .entry(symbol.to_string())
            .or_insert_with(|| PositionState::opened(date, target_weight));
        state.add_count += 1;
        state.entry_date = Some(date);
        state.target_weight = target_weight;
    }

    /// Change the requested weight without touching the add count or entry date.
    pub fn retarget(&mut self, symbol: &str, target_weight: f64) {
        if let Some(state) = self.states.get_mut(symbol) {
            state.target_weight = target_weight;
        }
    }

    /// HOLDING → FLAT.
    pub fn reset(&mut self, symbol: &str) -> Option<PositionState> {
        self.states.remove(symbol)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn open_creates_holding_state() {
        let mut book = PositionBook::new();
        assert!(!book.is_holding("AAPL"));

        let state = book.open("AAPL", d(1), 0.05);
        assert_eq!(state.add_count, 0);
        assert_eq!(state.entry_date, Some(d(1)));
        assert!(book.is_holding("AAPL"));
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn record_add_bumps_count_and_refreshes_date() {
        let mut book = PositionBook::new();
        book.open("AAPL", d(1), 0.05);
        book.record_add("AAPL", d(9), 0.10);

        let state = book.get("AAPL").unwrap();
        assert_eq!(state.add_count, 1);
        assert_eq!(state.entry_date, Some(d(9)));
        assert!((state.target_weight - 0.10).abs() < f64::EPSILON);
    }

    #[test]
    fn reset_returns_to_flat() {
        let mut book = PositionBook::new();
        book.open("AAPL", d(1), 0.05);
        book.record_add("AAPL", d(2), 0.10);

        let old = book.reset("AAPL").unwrap();
        assert_eq!(old.add_count, 1);
        assert!(book.get("AAPL").is_none());
        assert!(book.is_empty());

        // Re-entering starts a fresh count.
        book.open("AAPL", d(20), 0.05);
        assert_eq!(book.get("AAPL").unwrap().add_count, 0);
    }

    #[test]
    fn states_are_per_symbol() {
        let mut book = PositionBook::new();
        book.open("AAPL", d(1), 0.05);
        book.open("MSFT", d(2), 0.05);
        book.record_add("AAPL", d(3), 0.10);

        assert_eq!(book.get("AAPL").unwrap().add_count, 1);
        assert_eq!(book.get("MSFT").unwrap().add_count, 0);
    }

    #[test]
    fn retarget_keeps_entry() {
        let mut book = PositionBook::new();
        book.open("AAPL", d(1), 0.10);
        book.retarget("AAPL", 0.05);
        let state = book.get("AAPL").unwrap();
        assert_eq!(state.entry_date, Some(d(1)));
        assert!((state.target_weight - 0.05).abs() < f64::EPSILON);

        book.retarget("MSFT", 0.05);
        assert!(book.get("MSFT").is_none());
    }

    #[test]
    fn min_hold_window() {
        let state = PositionState::opened(d(1), 0.05);
        assert_eq!(state.days_held(d(4)), Some(3));
        assert!(state.within_min_hold(d(7), 7));
        assert!(!state.within_min_hold(d(8), 7));
        assert!(!state.within_min_hold(d(1), 0));

        let flat = PositionState {
            add_count: 0,
            entry_date: None,
            target_weight: 0.0,
        };
        assert!(!flat.within_min_hold(d(1), 7));
    }
}
