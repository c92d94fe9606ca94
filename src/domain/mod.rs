//! Core domain types and logic.

pub mod ohlcv;
pub mod series;
pub mod price;
pub mod indicator;
pub mod strategy;
pub mod strategies;
pub mod backtest;
pub mod metrics;
pub mod config_validation;
pub mod error;
