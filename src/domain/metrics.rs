//! Result summaries.
//!
//! [`Summary`] is the flat metrics mapping of a run; [`PerformanceStats`]
//! holds secondary risk statistics. Both are pure reductions over
//! [`BacktestSeries`] and can be recomputed from a stored result.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::backtest::{BacktestSeries, RunInfo};
use crate::domain::series::TimeSeries;
use crate::domain::strategy::StrategyParams;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub ticker: String,
    /// Requested start date.
    pub start: String,
    /// Last date actually simulated.
    pub end: String,
    pub initial_capital: f64,
    pub ending_value_strategy: f64,
    pub ending_value_buyhold: f64,
    pub profit_strategy: f64,
    pub profit_pct_strategy: f64,
    pub max_drawdown_strategy: f64,
    /// Total turnover.
    pub trades: f64,
    pub fee_rate_per_trade: f64,
    pub strategy_name: String,
    pub strategy_params: StrategyParams,
}

impl Summary {
    pub fn compute(run: &RunInfo, series: &BacktestSeries) -> Self {
        let initial_capital = run.config.initial_capital;
        let ending_value_strategy = last_or(&series.equity_strategy, initial_capital);
        let ending_value_buyhold = last_or(&series.equity_buyhold, initial_capital);

        let end = series
            .equity_strategy
            .last()
            .map(|(date, _)| date)
            .unwrap_or(run.start);

        Summary {
            ticker: run.symbol.clone(),
            start: run.start.format(DATE_FORMAT).to_string(),
            end: end.format(DATE_FORMAT).to_string(),
            initial_capital,
            ending_value_strategy,
            ending_value_buyhold,
            profit_strategy: ending_value_strategy - initial_capital,
            profit_pct_strategy: ending_value_strategy / initial_capital - 1.0,
            max_drawdown_strategy: min_or_zero(series.drawdown.values()),
            trades: series.trades.values().iter().sum(),
            fee_rate_per_trade: run.config.fee_rate_per_trade,
            strategy_name: run.strategy_name.clone(),
            strategy_params: run.strategy_params.clone(),
        }
    }

    /// The summary as a string-keyed mapping.
    pub fn to_json_map(&self) -> Result<Map<String, Value>, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Ok(Map::new()),
        }
    }
}

fn last_or(series: &TimeSeries, default: f64) -> f64 {
    series.last().map(|(_, v)| v).unwrap_or(default)
}

fn min_or_zero(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceStats {
    pub total_return: f64,
    pub benchmark_return: f64,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    /// Longest run of consecutive periods below a prior peak.
    pub max_drawdown_duration: usize,
    /// Fraction of periods holding a non-zero position.
    pub exposure: f64,
}

impl PerformanceStats {
    pub fn compute(series: &BacktestSeries, risk_free_rate: f64) -> Self {
        let equity = series.equity_strategy.values();
        let total_return = period_total_return(equity);
        let benchmark_return = period_total_return(series.equity_buyhold.values());

        let years = equity.len() as f64 / TRADING_DAYS_PER_YEAR;
        let annualized_return = if years > 0.0 && total_return.is_finite() {
            if 1.0 + total_return > 0.0 {
                (1.0 + total_return).powf(1.0 / years) - 1.0
            } else {
                -1.0
            }
        } else {
            0.0
        };

        let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
        let (annualized_volatility, sharpe_ratio, sortino_ratio) =
            compute_risk_adjusted(equity, daily_rf);

        let positions = series.position.values();
        let exposure = if positions.is_empty() {
            0.0
        } else {
            positions.iter().filter(|p| **p != 0.0).count() as f64 / positions.len() as f64
        };

        PerformanceStats {
            total_return,
            benchmark_return,
            annualized_return,
            annualized_volatility,
            sharpe_ratio,
            sortino_ratio,
            max_drawdown_duration: compute_drawdown_duration(equity),
            exposure,
        }
    }
}

fn period_total_return(equity: &[f64]) -> f64 {
    match (equity.first(), equity.last()) {
        (Some(&first), Some(&last)) if first > 0.0 => last / first - 1.0,
        _ => 0.0,
    }
}

fn compute_drawdown_duration(equity: &[f64]) -> usize {
    let Some(&first) = equity.first() else {
        return 0;
    };

    let mut peak = first;
    let mut current = 0usize;
    let mut longest = 0usize;

    for &value in equity {
        if value >= peak {
            peak = value;
            current = 0;
        } else {
            current += 1;
            longest = longest.max(current);
        }
    }

    longest
}

/// Returns (annualized volatility, Sharpe, Sortino) of period-over-period equity returns.
fn compute_risk_adjusted(equity: &[f64], daily_rf: f64) -> (f64, f64, f64) {
    if equity.len() < 2 {
        return (0.0, 0.0, 0.0);
    }

    let returns: Vec<f64> = equity
        .windows(2)
        .map(|w| {
            let prev = w[0];
            let curr = w[1];
            if prev > 0.0 {
                (curr - prev) / prev
            } else {
                0.0
            }
        })
        .collect();

    let n = returns.len() as f64;
    let mean: f64 = returns.iter().sum::<f64>() / n;

    let variance: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    let excess_return = mean - daily_rf;

    let sharpe = if stddev > 0.0 {
        (excess_return / stddev) * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    };

    let downside: f64 = returns
        .iter()
        .filter(|&&r| r < daily_rf)
        .map(|&r| (r - daily_rf).powi(2))
        .sum();
    let downside_stddev = (downside / n).sqrt();

    let sortino = if downside_stddev > 0.0 {
        (excess_return / downside_stddev) * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    };

    (stddev * TRADING_DAYS_PER_YEAR.sqrt(), sharpe, sortino)
}
