//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{
    self as backtest_engine, BacktestConfig, BacktestRequest, BacktestResult,
    DEFAULT_FEE_RATE_PER_TRADE, DEFAULT_INITIAL_CAPITAL, DEFAULT_LAG,
};
use crate::domain::config_validation::{
    parse_date, read_f64, validate_backtest_config, validate_data_config,
};
use crate::domain::error::SigtraderError;
use crate::domain::metrics::{PerformanceStats, Summary};
use crate::domain::strategies::{self, BUILTIN_NAMES};
use crate::domain::strategy::{Strategy, StrategyParams, parse_param, parse_param_value};
use crate::ports::config_port::ConfigPort;
use crate::ports::price_port::PriceSource;

pub const DEFAULT_STRATEGY: &str = "buy_and_hold";

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: &'a Summary,
    performance: &'a PerformanceStats,
}

#[derive(Parser, Debug)]
#[command(name = "sigtrader", about = "Single-asset signal backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Overrides [backtest] symbol
        #[arg(long)]
        symbol: Option<String>,
        /// Overrides [strategy] name
        #[arg(short, long)]
        strategy: Option<String>,
        /// Strategy parameter, repeatable; overrides [strategy] entries
        #[arg(short, long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// List built-in strategies
    Strategies,
    /// Show the data range for a symbol, or list available symbols
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Backtest {
            config,
            symbol,
            strategy,
            params,
            json,
        } => run_backtest(&config, symbol.as_deref(), strategy.as_deref(), &params, json),
        Command::Strategies => {
            for name in BUILTIN_NAMES {
                println!("{name}");
            }
            Ok(())
        }
        Command::Info { config, symbol } => run_info(&config, symbol.as_deref()),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, SigtraderError> {
    info!("Loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

fn run_backtest(
    config_path: &Path,
    symbol: Option<&str>,
    strategy: Option<&str>,
    params: &[String],
    json: bool,
) -> Result<(), SigtraderError> {
    let adapter = load_config(config_path)?;
    validate_data_config(&adapter)?;
    let source = build_price_source(&adapter)?;

    let result = execute_backtest(&adapter, source.as_ref(), symbol, strategy, params)?;
    let stats = PerformanceStats::compute(&result.series, result.run.config.risk_free_rate);

    if json {
        let report = JsonReport {
            summary: &result.summary,
            performance: &stats,
        };
        let text = serde_json::to_string_pretty(&report).map_err(std::io::Error::other)?;
        println!("{text}");
    } else {
        print!("{}", format_summary(&result.summary, &stats));
    }
    Ok(())
}

fn run_info(config_path: &Path, symbol: Option<&str>) -> Result<(), SigtraderError> {
    let adapter = load_config(config_path)?;
    validate_data_config(&adapter)?;
    let source = build_price_source(&adapter)?;

    match symbol {
        Some(symbol) => match source.data_range(symbol)? {
            Some((first, last, rows)) => println!("{symbol}: {first} to {last} ({rows} rows)"),
            None => {
                return Err(SigtraderError::NoData {
                    symbol: symbol.to_string(),
                });
            }
        },
        None => {
            for s in source.list_symbols()? {
                println!("{s}");
            }
        }
    }
    Ok(())
}

/// Validated config, strategy and request, then one engine run.
pub fn execute_backtest(
    config: &dyn ConfigPort,
    source: &dyn PriceSource,
    symbol: Option<&str>,
    strategy: Option<&str>,
    params: &[String],
) -> Result<BacktestResult, SigtraderError> {
    validate_backtest_config(config)?;
    let bt_config = build_backtest_config(config)?;
    let request = build_request(config, symbol, params)?;
    let strategy = resolve_strategy(config, strategy)?;

    info!(
        "Backtesting {} with {} from {}",
        request.symbol,
        strategy.name(),
        request.start
    );
    backtest_engine::run_backtest(source, strategy.as_ref(), &request, &bt_config)
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, SigtraderError> {
    let lag = match config.get_string("backtest", "lag") {
        Some(raw) => raw
            .trim()
            .parse::<usize>()
            .map_err(|_| SigtraderError::ConfigInvalid {
                section: "backtest".into(),
                key: "lag".into(),
                reason: "lag must be a non-negative integer".into(),
            })?,
        None => DEFAULT_LAG,
    };

    Ok(BacktestConfig {
        lag,
        initial_capital: read_f64(config, "backtest", "initial_capital", DEFAULT_INITIAL_CAPITAL)?,
        fee_rate_per_trade: read_f64(
            config,
            "backtest",
            "fee_rate_per_trade",
            DEFAULT_FEE_RATE_PER_TRADE,
        )?,
        adjust: config.get_bool("backtest", "adjust", true),
        risk_free_rate: read_f64(config, "backtest", "risk_free_rate", 0.0)?,
    })
}

/// Symbol and dates from [backtest]; parameters from [strategy] (minus
/// `name`) overlaid with `extra_params` (`key=value`).
pub fn build_request(
    config: &dyn ConfigPort,
    symbol: Option<&str>,
    extra_params: &[String],
) -> Result<BacktestRequest, SigtraderError> {
    let symbol = match symbol {
        Some(s) => s.to_string(),
        None => config
            .get_string("backtest", "symbol")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| SigtraderError::ConfigMissing {
                section: "backtest".into(),
                key: "symbol".into(),
            })?,
    };

    let start = parse_date(
        config.get_string("backtest", "start_date").as_deref(),
        "start_date",
    )?;
    let end = match config
        .get_string("backtest", "end_date")
        .filter(|s| !s.trim().is_empty())
    {
        Some(s) => Some(parse_date(Some(&s), "end_date")?),
        None => None,
    };

    let mut strategy_params = StrategyParams::new();
    for key in config.keys("strategy") {
        if key == "name" {
            continue;
        }
        if let Some(value) = config.get_string("strategy", &key) {
            strategy_params.insert(key, parse_param_value(&value));
        }
    }
    for pair in extra_params {
        let (key, value) = parse_param(pair).ok_or_else(|| SigtraderError::ConfigInvalid {
            section: "strategy".into(),
            key: pair.clone(),
            reason: "expected KEY=VALUE".into(),
        })?;
        strategy_params.insert(key, value);
    }

    Ok(BacktestRequest {
        symbol: symbol.trim().to_string(),
        start,
        end,
        strategy_params,
    })
}

pub fn resolve_strategy(
    config: &dyn ConfigPort,
    name: Option<&str>,
) -> Result<Box<dyn Strategy>, SigtraderError> {
    let name = name
        .map(str::to_string)
        .or_else(|| config.get_string("strategy", "name"))
        .unwrap_or_else(|| DEFAULT_STRATEGY.to_string());
    let name = name.trim();
    strategies::builtin(name).ok_or_else(|| SigtraderError::UnknownStrategy {
        name: name.to_string(),
    })
}

pub fn build_price_source(config: &dyn ConfigPort) -> Result<Box<dyn PriceSource>, SigtraderError> {
    let path = config
        .get_string("data", "path")
        .ok_or_else(|| SigtraderError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        })?;
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "csv".to_string());

    match source.trim() {
        "csv" => Ok(Box::new(CsvAdapter::new(PathBuf::from(path.trim())))),
        #[cfg(feature = "sqlite")]
        "sqlite" => Ok(Box::new(
            crate::adapters::sqlite_adapter::SqliteAdapter::from_config(config)?,
        )),
        other => Err(SigtraderError::ConfigInvalid {
            section: "data".into(),
            key: "source".into(),
            reason: format!("data source '{other}' is not available in this build"),
        }),
    }
}

pub fn format_summary(summary: &Summary, stats: &PerformanceStats) -> String {
    let params = serde_json::to_string(&summary.strategy_params).unwrap_or_default();
    let mut out = String::new();
    out.push_str(&format!(
        "=== {} | {} {} ===\n",
        summary.ticker, summary.strategy_name, params
    ));
    out.push_str(&format!("Period:           {} to {}\n", summary.start, summary.end));
    out.push_str(&format!("Initial Capital:  {:.2}\n", summary.initial_capital));
    out.push_str(&format!(
        "Ending Value:     {:.2} (buy & hold {:.2})\n",
        summary.ending_value_strategy, summary.ending_value_buyhold
    ));
    out.push_str(&format!(
        "Profit:           {:.2} ({:.2}%)\n",
        summary.profit_strategy,
        summary.profit_pct_strategy * 100.0
    ));
    out.push_str(&format!(
        "Max Drawdown:     {:.2}%\n",
        summary.max_drawdown_strategy * 100.0
    ));
    out.push_str(&format!(
        "Turnover:         {:.2} (fee rate {})\n",
        summary.trades, summary.fee_rate_per_trade
    ));
    out.push_str(&format!(
        "Annualized:       {:.2}%\n",
        stats.annualized_return * 100.0
    ));
    out.push_str(&format!("Volatility:       {:.2}%\n", stats.annualized_volatility * 100.0));
    out.push_str(&format!("Sharpe Ratio:     {:.2}\n", stats.sharpe_ratio));
    out.push_str(&format!("Sortino Ratio:    {:.2}\n", stats.sortino_ratio));
    out.push_str(&format!("Exposure:         {:.1}%\n", stats.exposure * 100.0));
    out
}
