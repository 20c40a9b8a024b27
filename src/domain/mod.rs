//! Core domain types and logic.

pub mod ohlcv;
pub mod indicator;
pub mod pipeline;
pub mod score;
pub mod position;
pub mod decision;
pub mod config;
pub mod config_validation;
pub mod portfolio;
pub mod timeline;
pub mod universe;
pub mod backtest;
pub mod error;
