//! Built-in sample strategies.
//!
//! Warmup periods are reported as NaN and left for the engine to flatten.

use crate::domain::indicator::{rate_of_change, rolling_stddev, sma};
use crate::domain::series::{RawTable, TimeSeries};
use crate::domain::strategy::{
    FnStrategy, Strategy, StrategyParams, param_bool, param_f64, param_usize,
};

pub const BUILTIN_NAMES: &[&str] = &["buy_and_hold", "sma_cross", "momentum", "mean_reversion"];

pub fn builtin(name: &str) -> Option<Box<dyn Strategy>> {
    let strategy = match name {
        "buy_and_hold" => FnStrategy::new(name, buy_and_hold),
        "sma_cross" => FnStrategy::new(name, sma_cross),
        "momentum" => FnStrategy::new(name, momentum),
        "mean_reversion" => FnStrategy::new(name, mean_reversion),
        _ => return None,
    };
    Some(Box::new(strategy))
}

fn with_values(prices: &TimeSeries, values: impl IntoIterator<Item = f64>) -> TimeSeries {
    TimeSeries::from_points(prices.dates().iter().copied().zip(values))
}

/// Fully long on every date.
pub fn buy_and_hold(prices: &TimeSeries, _raw: &RawTable, _params: &StrategyParams) -> TimeSeries {
    prices.map_values(|_| 1.0)
}

/// Long while SMA(`fast`) > SMA(`slow`); otherwise flat, or short when
/// `allow_short` is set.
pub fn sma_cross(prices: &TimeSeries, _raw: &RawTable, params: &StrategyParams) -> TimeSeries {
    let fast = sma(prices.values(), param_usize(params, "fast", 20));
    let slow = sma(prices.values(), param_usize(params, "slow", 50));
    let off = if param_bool(params, "allow_short", false) {
        -1.0
    } else {
        0.0
    };

    with_values(
        prices,
        fast.into_iter().zip(slow).map(|pair| match pair {
            (Some(f), Some(s)) if f > s => 1.0,
            (Some(_), Some(_)) => off,
            _ => f64::NAN,
        }),
    )
}

/// Sign of the `lookback` rate of change once it clears `threshold`.
pub fn momentum(prices: &TimeSeries, _raw: &RawTable, params: &StrategyParams) -> TimeSeries {
    let lookback = param_usize(params, "lookback", 20);
    let threshold = param_f64(params, "threshold", 0.0).abs();

    with_values(
        prices,
        rate_of_change(prices.values(), lookback)
            .into_iter()
            .map(|roc| match roc {
                Some(r) if r > threshold => 1.0,
                Some(r) if r < -threshold => -1.0,
                Some(_) => 0.0,
                None => f64::NAN,
            }),
    )
}

/// Fades z-score extremes of price around its `window` mean.
pub fn mean_reversion(prices: &TimeSeries, _raw: &RawTable, params: &StrategyParams) -> TimeSeries {
    let window = param_usize(params, "window", 20);
    let entry_z = param_f64(params, "entry_z", 1.0).abs();
    let means = sma(prices.values(), window);
    let stddevs = rolling_stddev(prices.values(), window);

    with_values(
        prices,
        prices
            .values()
            .iter()
            .zip(means.into_iter().zip(stddevs))
            .map(|(&p, stats)| match stats {
                (Some(mean), Some(sd)) if sd > 0.0 => {
                    let z = (p - mean) / sd;
                    if z > entry_z {
                        -1.0
                    } else if z < -entry_z {
                        1.0
                    } else {
                        0.0
                    }
                }
                (Some(_), Some(_)) => 0.0,
                _ => f64::NAN,
            }),
    )
}
