//! CLI wiring tests: config loading, request building, strategy resolution
//! and source selection, without spawning the binary.

mod common;

use common::*;
use sigtrader::adapters::file_config_adapter::FileConfigAdapter;
use sigtrader::cli;
use sigtrader::domain::backtest::{DEFAULT_FEE_RATE_PER_TRADE, DEFAULT_INITIAL_CAPITAL};
use sigtrader::domain::error::SigtraderError;
use sigtrader::domain::metrics::PerformanceStats;
use sigtrader::domain::strategy::Strategy;
use serde_json::json;
use std::io::Write;
use std::process::ExitCode;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", content).unwrap();
    file
}

fn config(content: &str) -> FileConfigAdapter {
    FileConfigAdapter::from_string(content).unwrap()
}

const FULL_CONFIG: &str = r#"
[backtest]
symbol = SPY
start_date = 2024-01-01
end_date = 2024-12-31
initial_capital = 1000
fee_rate_per_trade = 0.001
lag = 2
adjust = false
risk_free_rate = 0.02

[strategy]
name = sma_cross
fast = 5
slow = 20
allow_short = true

[data]
source = csv
path = /tmp/prices
"#;

const MINIMAL_CONFIG: &str = r#"
[backtest]
symbol = SPY
start_date = 2024-01-01

[data]
path = /tmp/prices
"#;

mod backtest_config {
    use super::*;

    #[test]
    fn reads_every_field() {
        let c = cli::build_backtest_config(&config(FULL_CONFIG)).unwrap();
        assert_eq!(c.lag, 2);
        assert_eq!(c.initial_capital, 1000.0);
        assert_eq!(c.fee_rate_per_trade, 0.001);
        assert!(!c.adjust);
        assert_eq!(c.risk_free_rate, 0.02);
    }

    #[test]
    fn uses_defaults() {
        let c = cli::build_backtest_config(&config(MINIMAL_CONFIG)).unwrap();
        assert_eq!(c.lag, 1);
        assert_eq!(c.initial_capital, DEFAULT_INITIAL_CAPITAL);
        assert_eq!(c.fee_rate_per_trade, DEFAULT_FEE_RATE_PER_TRADE);
        assert!(c.adjust);
        assert_eq!(c.risk_free_rate, 0.0);
    }

    #[test]
    fn non_numeric_values_are_rejected_not_defaulted() {
        for (key, value) in [
            ("initial_capital", "abc"),
            ("fee_rate_per_trade", "lots"),
            ("risk_free_rate", "n/a"),
            ("lag", "one"),
        ] {
            let c = config(&format!(
                "[backtest]\nsymbol = SPY\nstart_date = 2024-01-01\n{key} = {value}\n"
            ));
            assert!(
                matches!(
                    cli::build_backtest_config(&c),
                    Err(SigtraderError::ConfigInvalid { key: ref k, .. }) if k == key
                ),
                "{key} = {value} should be rejected"
            );
            assert!(matches!(
                cli::execute_backtest(&c, &MemoryPriceSource::new(), None, None, &[]),
                Err(SigtraderError::ConfigInvalid { .. })
            ));
        }
    }

    #[test]
    fn negative_lag_is_rejected() {
        let result = cli::build_backtest_config(&config(
            "[backtest]\nstart_date = 2024-01-01\nlag = -1\n",
        ));
        assert!(matches!(
            result,
            Err(SigtraderError::ConfigInvalid { key, .. }) if key == "lag"
        ));
    }
}

mod request {
    use super::*;

    #[test]
    fn reads_symbol_dates_and_strategy_params() {
        let r = cli::build_request(&config(FULL_CONFIG), None, &[]).unwrap();
        assert_eq!(r.symbol, "SPY");
        assert_eq!(r.start, date(2024, 1, 1));
        assert_eq!(r.end, Some(date(2024, 12, 31)));
        assert_eq!(r.strategy_params.len(), 3);
        assert_eq!(r.strategy_params["fast"], json!(5));
        assert_eq!(r.strategy_params["slow"], json!(20));
        assert_eq!(r.strategy_params["allow_short"], json!(true));
        assert!(!r.strategy_params.contains_key("name"));
    }

    #[test]
    fn end_date_is_optional() {
        let r = cli::build_request(&config(MINIMAL_CONFIG), None, &[]).unwrap();
        assert_eq!(r.end, None);
        assert!(r.strategy_params.is_empty());
    }

    #[test]
    fn symbol_override_wins() {
        let r = cli::build_request(&config(FULL_CONFIG), Some("QQQ"), &[]).unwrap();
        assert_eq!(r.symbol, "QQQ");
    }

    #[test]
    fn symbol_from_command_line_only() {
        let c = config("[backtest]\nstart_date = 2024-01-01\n");
        assert!(matches!(
            cli::build_request(&c, None, &[]),
            Err(SigtraderError::ConfigMissing { key, .. }) if key == "symbol"
        ));
        let r = cli::build_request(&c, Some("IWM"), &[]).unwrap();
        assert_eq!(r.symbol, "IWM");
    }

    #[test]
    fn param_overrides_replace_config_values() {
        let params = vec!["fast=8".to_string(), "label=trend".to_string()];
        let r = cli::build_request(&config(FULL_CONFIG), None, &params).unwrap();
        assert_eq!(r.strategy_params["fast"], json!(8));
        assert_eq!(r.strategy_params["slow"], json!(20));
        assert_eq!(r.strategy_params["label"], json!("trend"));
    }

    #[test]
    fn malformed_param_is_rejected() {
        let params = vec!["fast".to_string()];
        let result = cli::build_request(&config(FULL_CONFIG), None, &params);
        assert!(matches!(
            result,
            Err(SigtraderError::ConfigInvalid { section, .. }) if section == "strategy"
        ));
    }

    #[test]
    fn invalid_start_date() {
        let c = config("[backtest]\nsymbol = SPY\nstart_date = 2024/01/01\n");
        assert!(matches!(
            cli::build_request(&c, None, &[]),
            Err(SigtraderError::ConfigInvalid { key, .. }) if key == "start_date"
        ));
    }
}

mod strategy_resolution {
    use super::*;

    #[test]
    fn defaults_to_buy_and_hold() {
        let s = cli::resolve_strategy(&config(MINIMAL_CONFIG), None).unwrap();
        assert_eq!(s.name(), cli::DEFAULT_STRATEGY);
    }

    #[test]
    fn reads_name_from_config() {
        let s = cli::resolve_strategy(&config(FULL_CONFIG), None).unwrap();
        assert_eq!(s.name(), "sma_cross");
    }

    #[test]
    fn command_line_name_wins() {
        let s = cli::resolve_strategy(&config(FULL_CONFIG), Some("momentum")).unwrap();
        assert_eq!(s.name(), "momentum");
    }

    #[test]
    fn unknown_name_is_an_error() {
        match cli::resolve_strategy(&config(MINIMAL_CONFIG), Some("astrology")) {
            Err(e @ SigtraderError::UnknownStrategy { .. }) => {
                assert_eq!(ExitCode::from(&e), ExitCode::from(4));
            }
            Err(other) => panic!("expected UnknownStrategy, got {other}"),
            Ok(s) => panic!("expected error, got strategy {}", s.name()),
        }
    }
}

mod execute {
    use super::*;

    fn source() -> MemoryPriceSource {
        source_with("SPY", "2024-01-01", &generate_closes(40, 100.0))
    }

    #[test]
    fn runs_against_any_price_source() {
        let c = config(MINIMAL_CONFIG);
        let result = cli::execute_backtest(&c, &source(), None, None, &[]).unwrap();
        assert_eq!(result.summary.ticker, "SPY");
        assert_eq!(result.summary.strategy_name, "buy_and_hold");
        assert_eq!(result.summary.initial_capital, DEFAULT_INITIAL_CAPITAL);
        assert_eq!(result.series.prices.len(), 40);
    }

    #[test]
    fn strategy_and_params_from_command_line() {
        let c = config(MINIMAL_CONFIG);
        let params = vec!["lookback=5".to_string()];
        let result =
            cli::execute_backtest(&c, &source(), None, Some("momentum"), &params).unwrap();
        assert_eq!(result.summary.strategy_name, "momentum");
        assert_eq!(result.summary.strategy_params["lookback"], json!(5));
    }

    #[test]
    fn invalid_config_stops_before_loading_data() {
        let c = config("[backtest]\nsymbol = SPY\nstart_date = 2024-01-01\ninitial_capital = 0\n");
        let result = cli::execute_backtest(&c, &MemoryPriceSource::new(), None, None, &[]);
        assert!(matches!(
            result,
            Err(SigtraderError::ConfigInvalid { key, .. }) if key == "initial_capital"
        ));
    }

    #[test]
    fn missing_symbol_data_maps_to_no_data_exit_code() {
        let c = config(MINIMAL_CONFIG);
        let err = cli::execute_backtest(&c, &MemoryPriceSource::new(), None, None, &[])
            .unwrap_err();
        assert!(matches!(err, SigtraderError::NoData { .. }));
        assert_eq!(ExitCode::from(&err), ExitCode::from(5));
    }
}

mod price_sources {
    use super::*;
    use std::fs;

    #[test]
    fn csv_source_from_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("SPY.csv"),
            "date,close\n2024-01-01,100\n2024-01-02,101\n2024-01-03,102\n",
        )
        .unwrap();
        let c = config(&format!(
            "[backtest]\nsymbol = SPY\nstart_date = 2024-01-01\n\n[data]\nsource = csv\npath = {}\n",
            dir.path().display()
        ));

        let source = cli::build_price_source(&c).unwrap();
        assert_eq!(source.list_symbols().unwrap(), vec!["SPY"]);
        assert_eq!(
            source.data_range("SPY").unwrap(),
            Some((date(2024, 1, 1), date(2024, 1, 3), 3))
        );

        let result = cli::execute_backtest(&c, source.as_ref(), None, None, &[]).unwrap();
        assert_eq!(result.summary.end, "2024-01-03");
    }

    #[test]
    fn missing_path_is_config_missing() {
        let c = config("[data]\nsource = csv\n");
        assert!(matches!(
            cli::build_price_source(&c),
            Err(SigtraderError::ConfigMissing { key, .. }) if key == "path"
        ));
    }

    #[test]
    fn unknown_source_is_config_invalid() {
        let c = config("[data]\nsource = parquet\npath = /tmp\n");
        assert!(matches!(
            cli::build_price_source(&c),
            Err(SigtraderError::ConfigInvalid { key, .. }) if key == "source"
        ));
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn sqlite_source_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("prices.db");
        let c = config(&format!(
            "[data]\nsource = sqlite\npath = {}\npool_size = 1\n",
            db.display()
        ));
        let source = cli::build_price_source(&c).unwrap();
        assert!(matches!(
            source.load_prices("SPY", date(2024, 1, 1), None, true),
            Err(SigtraderError::DatabaseQuery { .. })
        ));
    }
}

mod config_file {
    use super::*;

    #[test]
    fn load_config_reads_file() {
        let file = write_temp_ini(FULL_CONFIG);
        let c = cli::load_config(file.path()).unwrap();
        let r = cli::build_request(&c, None, &[]).unwrap();
        assert_eq!(r.symbol, "SPY");
    }

    #[test]
    fn load_config_missing_file() {
        let result = cli::load_config(std::path::Path::new("/nonexistent/sigtrader.ini"));
        match result {
            Err(e @ SigtraderError::ConfigParse { .. }) => {
                assert_eq!(ExitCode::from(&e), ExitCode::from(2));
            }
            Err(other) => panic!("expected ConfigParse, got {other}"),
            Ok(_) => panic!("expected error"),
        }
    }
}

mod report_text {
    use super::*;

    #[test]
    fn format_summary_includes_headline_numbers() {
        let c = config(
            "[backtest]\nsymbol = SPY\nstart_date = 2024-01-01\ninitial_capital = 1000\nfee_rate_per_trade = 0\n",
        );
        let source = source_with("SPY", "2024-01-01", &[100.0, 110.0, 99.0]);
        let result = cli::execute_backtest(&c, &source, None, None, &["size=1".to_string()]).unwrap();
        let stats = PerformanceStats::compute(&result.series, 0.0);

        let text = cli::format_summary(&result.summary, &stats);
        assert!(text.contains("=== SPY | buy_and_hold {\"size\":1} ==="));
        assert!(text.contains("Period:           2024-01-01 to 2024-01-03"));
        assert!(text.contains("Ending Value:     990.00 (buy & hold 990.00)"));
        assert!(text.contains("Profit:           -10.00 (-1.00%)"));
        assert!(text.contains("Max Drawdown:     -10.00%"));
        assert!(text.contains("Turnover:         1.00"));
    }
}
