//! Vectorized backtest engine.
//!
//! Every derived series lives on the price series' dates. The pipeline is:
//! sanitize strategy output, lag it into held positions, compute period
//! returns and turnover, charge fees, compound equity, then derive the
//! buy-and-hold benchmark and the drawdown from the running peak.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::domain::error::SigtraderError;
use crate::domain::metrics::Summary;
use crate::domain::series::TimeSeries;
use crate::domain::strategy::{Strategy, StrategyParams};
use crate::ports::price_port::PriceSource;

pub const DEFAULT_LAG: usize = 1;
pub const DEFAULT_INITIAL_CAPITAL: f64 = 1_000_000.0;
pub const DEFAULT_FEE_RATE_PER_TRADE: f64 = 0.0005;

/// Execution parameters of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    /// Periods between a signal and the position it produces. A signal
    /// computed with data through date t is first held at t + lag, so 1 means
    /// "trade on the next bar" and 0 allows same-bar execution.
    pub lag: usize,
    /// Capital at the start of both the strategy and the benchmark curve.
    pub initial_capital: f64,
    /// Fee charged per unit of turnover, as a fraction of equity.
    /// 0.0005 is 5 basis points for a full flip from flat to fully invested.
    pub fee_rate_per_trade: f64,
    /// Use adjusted closes when the price source has them.
    pub adjust: bool,
    /// Annual risk-free rate for Sharpe/Sortino in [`PerformanceStats`](crate::domain::metrics::PerformanceStats).
    pub risk_free_rate: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            lag: DEFAULT_LAG,
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            fee_rate_per_trade: DEFAULT_FEE_RATE_PER_TRADE,
            adjust: true,
            risk_free_rate: 0.0,
        }
    }
}

/// What to backtest.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestRequest {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
    pub strategy_params: StrategyParams,
}

impl BacktestRequest {
    pub fn new(symbol: impl Into<String>, start: NaiveDate) -> Self {
        Self {
            symbol: symbol.into(),
            start,
            end: None,
            strategy_params: StrategyParams::new(),
        }
    }
}

/// Inputs echoed into the result for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct RunInfo {
    pub symbol: String,
    pub start: NaiveDate,
    pub strategy_name: String,
    pub strategy_params: StrategyParams,
    pub config: BacktestConfig,
}

/// All engine output series, each on the price series' dates.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestSeries {
    pub prices: TimeSeries,
    pub returns: TimeSeries,
    pub position: TimeSeries,
    pub trades: TimeSeries,
    pub net_returns: TimeSeries,
    pub equity_strategy: TimeSeries,
    pub equity_buyhold: TimeSeries,
    pub drawdown: TimeSeries,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub run: RunInfo,
    pub series: BacktestSeries,
    pub summary: Summary,
}

impl BacktestResult {
    /// Recomputes the summary from the stored series alone.
    pub fn resummarize(&self) -> Summary {
        Summary::compute(&self.run, &self.series)
    }
}

/// Fetch prices, generate the signal and simulate it.
///
/// Any price source error, including [`SigtraderError::NoData`], is returned
/// unchanged. Strategy output is never an error.
pub fn run_backtest(
    source: &dyn PriceSource,
    strategy: &dyn Strategy,
    request: &BacktestRequest,
    config: &BacktestConfig,
) -> Result<BacktestResult, SigtraderError> {
    let (prices, raw) =
        source.load_prices(&request.symbol, request.start, request.end, config.adjust)?;
    info!(
        symbol = %request.symbol,
        strategy = strategy.name(),
        periods = prices.len(),
        "running backtest"
    );

    let raw_position = strategy.positions(&prices, &raw, &request.strategy_params);
    let series = compute_series(prices, &raw_position, config);

    let run = RunInfo {
        symbol: request.symbol.clone(),
        start: request.start,
        strategy_name: strategy.name().to_string(),
        strategy_params: request.strategy_params.clone(),
        config: config.clone(),
    };
    let summary = Summary::compute(&run, &series);
    info!(
        ending_value = summary.ending_value_strategy,
        max_drawdown = summary.max_drawdown_strategy,
        turnover = summary.trades,
        "backtest complete"
    );

    Ok(BacktestResult {
        run,
        series,
        summary,
    })
}

/// Engine core: every series derived from clean prices and raw strategy output.
pub fn compute_series(
    prices: TimeSeries,
    raw_position: &TimeSeries,
    config: &BacktestConfig,
) -> BacktestSeries {
    let sanitized = sanitize_positions(prices.dates(), raw_position);
    let position = lag_positions(&sanitized, config.lag);
    let returns = period_returns(&prices);
    let trades = turnover(&position);
    let net_returns = net_returns(&position, &returns, &trades, config.fee_rate_per_trade);
    let equity_strategy = compound_equity(&net_returns, config.initial_capital);
    let equity_buyhold = buyhold_equity(&prices, config.initial_capital);
    let drawdown = drawdown_series(&equity_strategy);

    BacktestSeries {
        prices,
        returns,
        position,
        trades,
        net_returns,
        equity_strategy,
        equity_buyhold,
        drawdown,
    }
}

/// Reindex strategy output onto `index`. Dates the strategy did not cover
/// and non-finite values become 0.0; dates outside `index` are ignored. If a
/// date appears more than once the last value wins.
pub fn sanitize_positions(index: &[NaiveDate], raw: &TimeSeries) -> TimeSeries {
    let by_date: HashMap<NaiveDate, f64> = raw.iter().collect();

    let mut filled = 0usize;
    let values: Vec<f64> = index
        .iter()
        .map(|date| match by_date.get(date) {
            Some(v) if v.is_finite() => *v,
            _ => {
                filled += 1;
                0.0
            }
        })
        .collect();

    let extra = raw.iter().filter(|(d, _)| index.binary_search(d).is_err()).count();
    if filled > 0 || extra > 0 {
        debug!(filled, extra, "sanitized strategy output");
    }

    TimeSeries::on_index(index, values)
}

/// Shift forward by `lag` periods. The first `lag` entries are flat.
pub fn lag_positions(positions: &TimeSeries, lag: usize) -> TimeSeries {
    let n = positions.len();
    let lead = lag.min(n);
    let values = std::iter::repeat_n(0.0, lead)
        .chain(positions.values()[..n - lead].iter().copied())
        .collect();
    TimeSeries::on_index(positions.dates(), values)
}

/// p[t]/p[t-1] - 1, with 0 for the first period.
pub fn period_returns(prices: &TimeSeries) -> TimeSeries {
    let p = prices.values();
    let values = std::iter::once(0.0)
        .chain(p.windows(2).map(|w| w[1] / w[0] - 1.0))
        .take(p.len())
        .collect();
    TimeSeries::on_index(prices.dates(), values)
}

/// |pos[t] - pos[t-1]|, with 0 for the first period.
pub fn turnover(position: &TimeSeries) -> TimeSeries {
    let p = position.values();
    let values = std::iter::once(0.0)
        .chain(p.windows(2).map(|w| (w[1] - w[0]).abs()))
        .take(p.len())
        .collect();
    TimeSeries::on_index(position.dates(), values)
}

/// position * return - turnover * fee.
pub fn net_returns(
    position: &TimeSeries,
    returns: &TimeSeries,
    trades: &TimeSeries,
    fee_rate_per_trade: f64,
) -> TimeSeries {
    let values = position
        .values()
        .iter()
        .zip(returns.values())
        .zip(trades.values())
        .map(|((pos, ret), traded)| pos * ret - traded * fee_rate_per_trade)
        .collect();
    TimeSeries::on_index(position.dates(), values)
}

/// initial_capital * prod(1 + r[0..=t]).
pub fn compound_equity(net_returns: &TimeSeries, initial_capital: f64) -> TimeSeries {
    let values = net_returns
        .values()
        .iter()
        .scan(1.0, |growth, r| {
            *growth *= 1.0 + r;
            Some(initial_capital * *growth)
        })
        .collect();
    TimeSeries::on_index(net_returns.dates(), values)
}

/// initial_capital * p[t] / p[0].
pub fn buyhold_equity(prices: &TimeSeries, initial_capital: f64) -> TimeSeries {
    match prices.first() {
        Some((_, base)) => prices.map_values(|p| initial_capital * (p / base)),
        None => prices.clone(),
    }
}

/// equity[t] / max(equity[0..=t]) - 1.
pub fn drawdown_series(equity: &TimeSeries) -> TimeSeries {
    let values = equity
        .values()
        .iter()
        .scan(f64::NEG_INFINITY, |peak, &e| {
            *peak = peak.max(e);
            Some(e / *peak - 1.0)
        })
        .collect();
    TimeSeries::on_index(equity.dates(), values)
}
