#![allow(dead_code)]

use chrono::NaiveDate;
pub use sigtrader::adapters::memory_adapter::MemoryPriceSource;
use sigtrader::domain::backtest::BacktestConfig;
pub use sigtrader::domain::ohlcv::OhlcvBar;
use sigtrader::domain::series::TimeSeries;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn make_bar(date_str: &str, close: f64) -> OhlcvBar {
    OhlcvBar {
        date: parse_date(date_str),
        open: close,
        high: close,
        low: close,
        close,
        adj_close: None,
        volume: 1000,
    }
}

/// Consecutive calendar days starting at `start_str`.
pub fn make_bars(start_str: &str, closes: &[f64]) -> Vec<OhlcvBar> {
    let start = parse_date(start_str);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| OhlcvBar {
            date: start + chrono::Duration::days(i as i64),
            open: close,
            high: close,
            low: close,
            close,
            adj_close: None,
            volume: 1000,
        })
        .collect()
}

/// A deterministic zig-zag drift, useful for strategies that need a warmup.
pub fn generate_closes(count: usize, base: f64) -> Vec<f64> {
    (0..count)
        .map(|i| base + i as f64 * 0.25 + ((i % 7) as f64 - 3.0) * 1.5)
        .collect()
}

pub fn source_with(symbol: &str, start_str: &str, closes: &[f64]) -> MemoryPriceSource {
    MemoryPriceSource::new().with_bars(symbol, make_bars(start_str, closes))
}

pub fn series_on(dates: &[NaiveDate], values: &[f64]) -> TimeSeries {
    TimeSeries::from_points(dates.iter().copied().zip(values.iter().copied()))
}

pub fn frictionless_config() -> BacktestConfig {
    BacktestConfig {
        fee_rate_per_trade: 0.0,
        ..BacktestConfig::default()
    }
}

pub fn assert_close(actual: f64, expected: f64) {
    approx::assert_relative_eq!(actual, expected, epsilon = 1e-9, max_relative = 1e-9);
}
