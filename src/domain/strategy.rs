//! Pluggable signal generation.
//!
//! A strategy turns a price history into a desired exposure per date. Output
//! is untrusted: it may use other dates, skip dates, or contain NaN. The
//! backtest engine realigns and sanitizes it before use.

use crate::domain::series::{RawTable, TimeSeries};
use serde_json::{Map, Value};

/// Free-form strategy parameters, echoed verbatim into the summary.
pub type StrategyParams = Map<String, Value>;

pub trait Strategy {
    /// Reporting name. Never affects computation.
    fn name(&self) -> &str;

    fn positions(&self, prices: &TimeSeries, raw: &RawTable, params: &StrategyParams)
    -> TimeSeries;
}

type PositionFn = dyn Fn(&TimeSeries, &RawTable, &StrategyParams) -> TimeSeries;

/// Adapts a plain function or closure into a [`Strategy`].
pub struct FnStrategy {
    name: String,
    f: Box<PositionFn>,
}

impl FnStrategy {
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&TimeSeries, &RawTable, &StrategyParams) -> TimeSeries + 'static,
    {
        Self {
            name: name.into(),
            f: Box::new(f),
        }
    }
}

impl std::fmt::Debug for FnStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStrategy").field("name", &self.name).finish()
    }
}

impl Strategy for FnStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn positions(
        &self,
        prices: &TimeSeries,
        raw: &RawTable,
        params: &StrategyParams,
    ) -> TimeSeries {
        (self.f)(prices, raw, params)
    }
}

impl<S: Strategy + ?Sized> Strategy for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn positions(
        &self,
        prices: &TimeSeries,
        raw: &RawTable,
        params: &StrategyParams,
    ) -> TimeSeries {
        (**self).positions(prices, raw, params)
    }
}

/// Reads a non-negative integer parameter. Floats are truncated; strings are parsed.
pub fn param_usize(params: &StrategyParams, key: &str, default: usize) -> usize {
    match params.get(key) {
        Some(Value::Number(n)) => n
            .as_u64()
            .map(|v| v as usize)
            .or_else(|| n.as_f64().filter(|v| *v >= 0.0).map(|v| v as usize))
            .unwrap_or(default),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
        _ => default,
    }
}

pub fn param_f64(params: &StrategyParams, key: &str, default: f64) -> f64 {
    match params.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(default),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
        _ => default,
    }
}

pub fn param_bool(params: &StrategyParams, key: &str, default: bool) -> bool {
    match params.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => true,
            "false" | "no" | "0" => false,
            _ => default,
        },
        Some(Value::Number(n)) => n.as_f64().map(|v| v != 0.0).unwrap_or(default),
        _ => default,
    }
}

/// Values that read as JSON (numbers, booleans, quoted strings) keep their
/// type; anything else is stored as a string.
pub fn parse_param_value(value: &str) -> Value {
    let value = value.trim();
    serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()))
}

/// Parses a `key=value` pair into a parameter entry.
pub fn parse_param(pair: &str) -> Option<(String, Value)> {
    let (key, value) = pair.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), parse_param_value(value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(v: Value) -> StrategyParams {
        match v {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn fn_strategy_reports_name_and_delegates() {
        let s = FnStrategy::new("flat", |prices, _raw, _params| prices.map_values(|_| 0.0));
        assert_eq!(s.name(), "flat");

        let prices = TimeSeries::from_points(vec![(
            chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            10.0,
        )]);
        let raw = RawTable::new("X", vec![]);
        let out = s.positions(&prices, &raw, &StrategyParams::new());
        assert_eq!(out.values(), &[0.0]);
    }

    #[test]
    fn boxed_strategy_delegates() {
        let s: Box<dyn Strategy> = Box::new(FnStrategy::new("boxed", |p, _, _| p.clone()));
        assert_eq!(s.name(), "boxed");
    }

    #[test]
    fn param_usize_variants() {
        let p = params(json!({"a": 5, "b": 7.9, "c": "12", "d": -3, "e": "x"}));
        assert_eq!(param_usize(&p, "a", 0), 5);
        assert_eq!(param_usize(&p, "b", 0), 7);
        assert_eq!(param_usize(&p, "c", 0), 12);
        assert_eq!(param_usize(&p, "d", 9), 9);
        assert_eq!(param_usize(&p, "e", 9), 9);
        assert_eq!(param_usize(&p, "missing", 4), 4);
    }

    #[test]
    fn param_f64_variants() {
        let p = params(json!({"a": 1.5, "b": "2.25", "c": true}));
        assert_eq!(param_f64(&p, "a", 0.0), 1.5);
        assert_eq!(param_f64(&p, "b", 0.0), 2.25);
        assert_eq!(param_f64(&p, "c", 0.5), 0.5);
    }

    #[test]
    fn param_bool_variants() {
        let p = params(json!({"a": true, "b": "no", "c": 1, "d": "maybe"}));
        assert!(param_bool(&p, "a", false));
        assert!(!param_bool(&p, "b", true));
        assert!(param_bool(&p, "c", false));
        assert!(param_bool(&p, "d", true));
    }

    #[test]
    fn parse_param_keeps_json_types() {
        assert_eq!(parse_param("fast=10"), Some(("fast".into(), json!(10))));
        assert_eq!(parse_param("short = true"), Some(("short".into(), json!(true))));
        assert_eq!(parse_param("label=abc"), Some(("label".into(), json!("abc"))));
        assert_eq!(parse_param("noequals"), None);
        assert_eq!(parse_param("=5"), None);
    }
}
