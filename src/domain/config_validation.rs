//! Configuration validation.
//!
//! Checks the numeric and date fields a run depends on before any data is
//! loaded. The symbol may come from the command line and is resolved later.

use crate::domain::error::SigtraderError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const DATA_SOURCES: &[&str] = &["csv", "sqlite"];

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    validate_dates(config)?;
    validate_initial_capital(config)?;
    validate_fee_rate(config)?;
    validate_lag(config)?;
    validate_risk_free_rate(config)?;
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "csv".to_string());
    if !DATA_SOURCES.contains(&source.trim()) {
        return Err(invalid(
            "data",
            "source",
            format!("unknown data source '{}' (expected csv or sqlite)", source.trim()),
        ));
    }
    match config.get_string("data", "path") {
        Some(p) if !p.trim().is_empty() => Ok(()),
        _ => Err(SigtraderError::ConfigMissing {
            section: "data".to_string(),
            key: "path".to_string(),
        }),
    }
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> SigtraderError {
    SigtraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// Reads `[section] key` as a number. Absent or blank yields `default`;
/// anything that does not parse is rejected rather than defaulted.
pub fn read_f64(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, SigtraderError> {
    match config.get_string(section, key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<f64>()
            .map_err(|_| {
                invalid(
                    section,
                    key,
                    format!("{key} must be a number, got '{}'", raw.trim()),
                )
            }),
        _ => Ok(default),
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let value = read_f64(config, "backtest", "initial_capital", 1.0)?;
    if !(value > 0.0 && value.is_finite()) {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_fee_rate(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let value = read_f64(config, "backtest", "fee_rate_per_trade", 0.0)?;
    if !(value >= 0.0 && value.is_finite()) {
        return Err(invalid(
            "backtest",
            "fee_rate_per_trade",
            "fee_rate_per_trade must be non-negative",
        ));
    }
    Ok(())
}

fn validate_lag(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let Some(raw) = config.get_string("backtest", "lag") else {
        return Ok(());
    };
    match raw.trim().parse::<i64>() {
        Ok(v) if v >= 0 => Ok(()),
        _ => Err(invalid(
            "backtest",
            "lag",
            "lag must be a non-negative integer",
        )),
    }
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let value = read_f64(config, "backtest", "risk_free_rate", 0.0)?;
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(
            "backtest",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let start_str = config.get_string("backtest", "start_date");
    let start_date = parse_date(start_str.as_deref(), "start_date")?;

    let Some(end_str) = config
        .get_string("backtest", "end_date")
        .filter(|s| !s.trim().is_empty())
    else {
        return Ok(());
    };
    let end_date = parse_date(Some(&end_str), "end_date")?;

    if start_date > end_date {
        return Err(invalid(
            "backtest",
            "start_date",
            "start_date must not be after end_date",
        ));
    }
    Ok(())
}

pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, SigtraderError> {
    match value {
        None => Err(SigtraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            invalid(
                "backtest",
                field,
                format!("invalid {} format, expected YYYY-MM-DD", field),
            )
        }),
    }
}
