//! CSV file price adapter.
//!
//! One file per symbol, `<SYMBOL>.csv`, with a header row. Columns are found
//! by name: `date` and `close` are required; `open`, `high`, `low`,
//! `adj_close` (or `adj close`) and `volume` are optional. Empty cells are
//! gaps, including an empty cell in an adjusted close column that exists.

use crate::domain::error::SigtraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::price::clean_bars;
use crate::domain::series::{RawTable, TimeSeries};
use crate::ports::price_port::{PriceSource, in_window};
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

const EXTENSION: &str = ".csv";

pub struct CsvAdapter {
    base_path: PathBuf,
}

struct Columns {
    date: usize,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    close: usize,
    adj_close: Option<usize>,
    volume: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, SigtraderError> {
        let find = |names: &[&str]| {
            headers.iter().position(|h| {
                let h = h.trim().to_lowercase();
                names.iter().any(|n| h == *n)
            })
        };
        let required = |names: &[&str]| {
            find(names).ok_or_else(|| SigtraderError::Database {
                reason: format!("missing {} column", names[0]),
            })
        };

        Ok(Self {
            date: required(&["date"])?,
            open: find(&["open"]),
            high: find(&["high"]),
            low: find(&["low"]),
            close: required(&["close"])?,
            adj_close: find(&["adj_close", "adj close", "adjclose"]),
            volume: find(&["volume"]),
        })
    }
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}{}", symbol, EXTENSION))
    }

    fn read_bars(&self, symbol: &str) -> Result<Option<Vec<OhlcvBar>>, SigtraderError> {
        let path = self.csv_path(symbol);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).map_err(|e| SigtraderError::Database {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr.headers().map_err(|e| SigtraderError::Database {
            reason: format!("CSV header error: {}", e),
        })?;
        let cols = Columns::from_headers(headers)?;

        let mut bars = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| SigtraderError::Database {
                reason: format!("CSV parse error: {}", e),
            })?;
            bars.push(parse_record(&record, &cols)?);
        }

        debug!(symbol, rows = bars.len(), path = %path.display(), "read csv");
        Ok(Some(bars))
    }
}

fn cell<'r>(record: &'r csv::StringRecord, idx: Option<usize>) -> &'r str {
    idx.and_then(|i| record.get(i)).map(str::trim).unwrap_or("")
}

fn parse_price(value: &str, column: &str) -> Result<f64, SigtraderError> {
    if value.is_empty() {
        return Ok(f64::NAN);
    }
    value.parse().map_err(|e| SigtraderError::Database {
        reason: format!("invalid {} value: {}", column, e),
    })
}

fn parse_record(record: &csv::StringRecord, cols: &Columns) -> Result<OhlcvBar, SigtraderError> {
    let date_str = cell(record, Some(cols.date));
    let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
        SigtraderError::Database {
            reason: format!("invalid date format: {}", e),
        }
    })?;

    let adj_close = cols
        .adj_close
        .map(|idx| parse_price(cell(record, Some(idx)), "adj_close"))
        .transpose()?;

    let volume_str = cell(record, cols.volume);
    let volume = if volume_str.is_empty() {
        0
    } else {
        // Some providers write volume as a float.
        volume_str
            .parse::<i64>()
            .or_else(|_| volume_str.parse::<f64>().map(|v| v as i64))
            .map_err(|e| SigtraderError::Database {
                reason: format!("invalid volume value: {}", e),
            })?
    };

    Ok(OhlcvBar {
        date,
        open: parse_price(cell(record, cols.open), "open")?,
        high: parse_price(cell(record, cols.high), "high")?,
        low: parse_price(cell(record, cols.low), "low")?,
        close: parse_price(cell(record, Some(cols.close)), "close")?,
        adj_close,
        volume,
    })
}

impl PriceSource for CsvAdapter {
    fn load_prices(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: Option<NaiveDate>,
        adjust: bool,
    ) -> Result<(TimeSeries, RawTable), SigtraderError> {
        let bars = self
            .read_bars(symbol)?
            .unwrap_or_default()
            .into_iter()
            .filter(|b| in_window(b.date, start, end))
            .collect();
        clean_bars(symbol, bars, adjust)
    }

    fn list_symbols(&self) -> Result<Vec<String>, SigtraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| SigtraderError::Database {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| SigtraderError::Database {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(symbol) = name_str.strip_suffix(EXTENSION) {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, SigtraderError> {
        let Some(bars) = self.read_bars(symbol)? else {
            return Ok(None);
        };
        let min = bars.iter().map(|b| b.date).min();
        let max = bars.iter().map(|b| b.date).max();
        Ok(min.zip(max).map(|(min, max)| (min, max, bars.len())))
    }
}
